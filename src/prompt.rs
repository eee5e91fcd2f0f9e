use std::io::{self, BufRead, Write};

/// Writes `question` to `output` and reads one trimmed line from `input`.
///
/// End of input is an error, so a closed stdin cannot loop forever or silently pick defaults
/// for required values.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("no answer for {:?}", question.trim()),
        ));
    }
    Ok(line.trim().to_string())
}

/// Like [`ask`], but repeats the question until the answer is not blank.
pub fn ask_required<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<String> {
    loop {
        let answer = ask(input, output, question)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
    }
}
