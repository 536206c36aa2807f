//! JSON lines broker
//!
//! 逐行回放文件中的消息，每行一个 `Message` JSON 对象。
//! 读到文件末尾后进入空闲轮询，后续追加的行仍会被读取。

use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::Message;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

use crate::broker::BrokerSource;
use crate::error::BrokerError;

/// 文件回放 broker
pub struct JsonLinesBroker {
    name: String,
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: u64,
    poll_interval: Duration,
    at_eof: bool,
}

impl JsonLinesBroker {
    /// 打开文件
    ///
    /// # Errors
    /// 文件无法打开时返回 `BrokerError::Io`
    pub async fn open(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        poll_interval: Duration,
    ) -> Result<Self, BrokerError> {
        let name = name.into();
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        info!(broker = %name, path = %path.display(), "Opened JSON lines broker");

        Ok(Self {
            name,
            path,
            lines: BufReader::new(file).lines(),
            line_no: 0,
            poll_interval,
            at_eof: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 已读取的行数（含空行与格式错误的行）
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }
}

impl BrokerSource for JsonLinesBroker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn poll(&mut self) -> Result<Option<Message>, BrokerError> {
        match self.lines.next_line().await? {
            Some(line) => {
                self.line_no += 1;
                self.at_eof = false;
                let line = line.trim();
                if line.is_empty() {
                    return Ok(None);
                }
                serde_json::from_str::<Message>(line).map(Some).map_err(|e| {
                    BrokerError::malformed(format!("line {}: {e}", self.line_no))
                })
            }
            None => {
                if !self.at_eof {
                    debug!(broker = %self.name, lines = self.line_no, "Reached end of file");
                    self.at_eof = true;
                }
                tokio::time::sleep(self.poll_interval).await;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_replays_lines_and_flags_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"token":"t1","app":"game","payload":{{"a":1}}}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"token":"t2","app":"game"}}"#).unwrap();
        file.flush().unwrap();

        let mut broker = JsonLinesBroker::open("file", file.path(), Duration::from_millis(1))
            .await
            .unwrap();

        let first = broker.poll().await.unwrap().unwrap();
        assert_eq!(first.token, "t1");
        assert_eq!(first.payload["a"], 1);

        // Blank line
        assert!(broker.poll().await.unwrap().is_none());

        match broker.poll().await {
            Err(BrokerError::Malformed { message }) => assert!(message.starts_with("line 3")),
            other => panic!("expected malformed, got {other:?}"),
        }

        assert_eq!(broker.poll().await.unwrap().unwrap().token, "t2");
        assert!(broker.poll().await.unwrap().is_none());
        assert_eq!(broker.lines_read(), 4);
    }

    #[tokio::test]
    async fn test_reads_lines_appended_after_eof() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut broker = JsonLinesBroker::open("file", file.path(), Duration::from_millis(1))
            .await
            .unwrap();
        assert!(broker.poll().await.unwrap().is_none());

        writeln!(file, r#"{{"token":"late","app":"game"}}"#).unwrap();
        file.flush().unwrap();

        assert_eq!(broker.poll().await.unwrap().unwrap().token, "late");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result =
            JsonLinesBroker::open("file", "/nonexistent/messages.jsonl", Duration::from_millis(1))
                .await;
        assert!(matches!(result, Err(BrokerError::Io(_))));
    }
}
