use std::str::FromStr;

use crate::timer::{LifecycleEvent, TrackerController};

/// One line typed into the headless driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Start {
        task_id: String,
        project_id: String,
        task_name: String,
    },
    Pause,
    Resume,
    Finish,
    Status,
    Ack,
    Hide,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".to_string());
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "start" => {
                let task_id = words
                    .next()
                    .ok_or("usage: start <task_id> [project_id] [name...]")?
                    .to_string();
                let project_id = words.next().unwrap_or_default().to_string();
                let task_name = words.collect::<Vec<_>>().join(" ");
                ShellCommand::Start {
                    task_id,
                    project_id,
                    task_name,
                }
            }
            "pause" => ShellCommand::Pause,
            "resume" => ShellCommand::Resume,
            "finish" | "stop" => ShellCommand::Finish,
            "status" => ShellCommand::Status,
            "ack" => ShellCommand::Ack,
            "hide" => ShellCommand::Hide,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(format!("unknown command: {other}")),
        };
        Ok(command)
    }
}

pub async fn start_task(
    controller: &TrackerController,
    task_id: &str,
    project_id: &str,
    task_name: &str,
) -> Result<String, String> {
    let selection = controller
        .select_task(task_id, project_id, task_name)
        .await
        .map_err(|e| e.to_string())?;
    let state = controller
        .start(selection)
        .await
        .map_err(|e| e.to_string())?;
    Ok(format!(
        "capturing {}",
        state.selected_task_name.unwrap_or_default()
    ))
}

pub async fn pause_task(controller: &TrackerController) -> Result<String, String> {
    let state = controller.pause().await.map_err(|e| e.to_string())?;
    Ok(format!("paused at {}s", state.elapsed_seconds))
}

pub async fn resume_task(controller: &TrackerController) -> Result<String, String> {
    controller.resume().await.map_err(|e| e.to_string())?;
    Ok("capturing".to_string())
}

pub async fn finish_task(controller: &TrackerController) -> Result<String, String> {
    let summary = controller.finish().await.map_err(|e| e.to_string())?;
    Ok(format!(
        "submitted {} records for {} ({}s total, {}s active)",
        summary.records, summary.task_id, summary.total_seconds, summary.active_seconds
    ))
}

pub async fn get_status(controller: &TrackerController) -> Result<String, String> {
    let snapshot = controller.get_snapshot().await;
    serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())
}

/// Runs one parsed command. `Quit` is left to the caller.
pub async fn dispatch(
    controller: &TrackerController,
    command: ShellCommand,
) -> Result<String, String> {
    match command {
        ShellCommand::Start {
            task_id,
            project_id,
            task_name,
        } => start_task(controller, &task_id, &project_id, &task_name).await,
        ShellCommand::Pause => pause_task(controller).await,
        ShellCommand::Resume => resume_task(controller).await,
        ShellCommand::Finish => finish_task(controller).await,
        ShellCommand::Status => get_status(controller).await,
        ShellCommand::Ack => {
            controller.acknowledge_idle_warning().await;
            Ok("idle warning dismissed".to_string())
        }
        ShellCommand::Hide => {
            controller
                .handle_lifecycle_event(LifecycleEvent::WindowHidden)
                .await
                .map_err(|e| e.to_string())?;
            Ok("draft saved".to_string())
        }
        ShellCommand::Quit => Ok("bye".to_string()),
    }
}
