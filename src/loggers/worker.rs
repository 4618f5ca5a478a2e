use tokio::sync::mpsc;
use crate::loggers::core::LogRecord;

pub struct LogWorker {
    receiver: mpsc::Receiver<LogRecord>,
    pretty: bool,
}

impl LogWorker {
    pub fn new(receiver: mpsc::Receiver<LogRecord>, pretty: bool) -> Self {
        Self { receiver, pretty }
    }

    pub async fn run(mut self) {
        while let Some(record) = self.receiver.recv().await {
            if let Some(line) = self.render(&record) {
                println!("{}", line);
            }
        }
    }

    /// One JSON object per line, or a level-first human line when pretty.
    pub fn render(&self, record: &LogRecord) -> Option<String> {
        if !self.pretty {
            return serde_json::to_string(record).ok();
        }

        let mut line = format!(
            "{} [{}] ({}): {}",
            record.level.label(),
            record.ts.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.name,
            record.msg
        );
        if let Some(err) = &record.err {
            line.push_str(&format!("\n    {}", err));
            if let Some(stack) = &err.stack {
                for frame in stack.lines() {
                    line.push_str(&format!("\n    {}", frame));
                }
            }
        }
        for (key, value) in &record.ctx {
            line.push_str(&format!("\n    {}: {}", key, value));
        }
        Some(line)
    }
}
