use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureUpload {
    pub url: String,
}

/// Captures the screen and stores the image, returning where it went.
#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture_and_upload(&self) -> Result<CaptureUpload>;
}

/// Delegates capture and upload to an external program that prints the URL
/// of the stored image on its last stdout line.
#[derive(Debug, Clone)]
pub struct CommandCapturer {
    program: String,
    args: Vec<String>,
}

impl CommandCapturer {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("capture command is empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl Capturer for CommandCapturer {
    async fn capture_and_upload(&self) -> Result<CaptureUpload> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to spawn capture command {}", self.program))?;

        if !output.status.success() {
            bail!(
                "capture command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let url = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| anyhow!("capture command printed no URL"))?;

        Ok(CaptureUpload {
            url: url.to_string(),
        })
    }
}

/// Used when no capture command is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCapturer;

#[async_trait]
impl Capturer for DisabledCapturer {
    async fn capture_and_upload(&self) -> Result<CaptureUpload> {
        Err(anyhow!("screenshot capture is not configured"))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn last_stdout_line_is_the_url() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo uploading; echo https://cdn.example.test/shot.png".to_string(),
        ];
        let capturer = CommandCapturer::new(&command).unwrap();
        let upload = capturer.capture_and_upload().await.unwrap();
        assert_eq!(upload.url, "https://cdn.example.test/shot.png");
    }

    #[tokio::test]
    async fn failing_command_is_an_error() {
        let command = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
        let capturer = CommandCapturer::new(&command).unwrap();
        assert!(capturer.capture_and_upload().await.is_err());
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandCapturer::new(&[]).is_err());
    }
}
