use crate::config::SecureString;

const REDACTED: &str = "********";

pub trait StatusSink {
    fn emit(&mut self, line: &str);
}

#[derive(Debug, Default)]
pub struct ConsoleStatus;

impl StatusSink for ConsoleStatus {
    fn emit(&mut self, line: &str) {
        println!("{}", line);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn emit(&mut self, line: &str) {
        (**self).emit(line);
    }
}

#[derive(Debug, Default)]
pub struct RecordedStatus {
    pub lines: Vec<String>,
}

impl StatusSink for RecordedStatus {
    fn emit(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Replace every occurrence of the secret in `text`.
pub fn redact(text: &str, secret: &SecureString) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret.expose(), REDACTED)
}
