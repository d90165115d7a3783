use tokio::process::Command;

/// Keeps child processes spawned during shell startup from flashing a console
/// window on Windows. A no-op elsewhere.
pub trait HideWindow {
    fn hide_window(&mut self) -> &mut Self;
}

impl HideWindow for Command {
    fn hide_window(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            self.creation_flags(CREATE_NO_WINDOW);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use tokio::process::Command;

    use super::HideWindow;

    #[tokio::test]
    async fn hidden_command_still_runs() {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "exit 0"]);
            cmd
        } else {
            Command::new("true")
        };

        let status = cmd
            .hide_window()
            .status()
            .await
            .expect("command should spawn");

        assert!(status.success());
    }
}
