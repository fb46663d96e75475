//! Host keyboard layout switching
//!
//! Layouts are named by their hex language id ("0409" is US English).

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::{LayoutConfig, SwitcherKind, LAYOUT_PLACEHOLDER};
use crate::error::WatcherError;

/// Something that can make a keyboard layout active on the host
pub trait LayoutSwitcher {
    fn switch_to(&mut self, layout: &str) -> Result<(), WatcherError>;
}

/// Build the switcher selected in the config
pub fn switcher_for(config: &LayoutConfig) -> Result<Box<dyn LayoutSwitcher>, WatcherError> {
    match config.switcher {
        SwitcherKind::Log => Ok(Box::new(LogSwitcher)),
        SwitcherKind::Command => Ok(Box::new(CommandSwitcher::new(
            config.command.clone(),
            config.command_timeout(),
        )?)),
        #[cfg(windows)]
        SwitcherKind::Windows => Ok(Box::new(WindowsSwitcher)),
        #[cfg(not(windows))]
        SwitcherKind::Windows => Err(WatcherError::InvalidConfig(
            "layout.switcher = \"windows\" is only available on Windows".to_string(),
        )),
    }
}

/// Parse a layout id ("0409", "0x0409") into its numeric value
pub fn parse_layout_id(layout: &str) -> Result<u32, WatcherError> {
    let digits = layout
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|_| WatcherError::LayoutSwitch {
        layout: layout.to_string(),
        reason: "not a hexadecimal layout id".to_string(),
    })
}

/// Logs the requested layout and does nothing else
#[derive(Debug, Default)]
pub struct LogSwitcher;

impl LayoutSwitcher for LogSwitcher {
    fn switch_to(&mut self, layout: &str) -> Result<(), WatcherError> {
        info!("Keyboard layout -> {layout}");
        Ok(())
    }
}

/// Runs an external program, e.g. `["setxkbmap", "{layout}"]`
///
/// The program gets `timeout` to finish; after that it is killed so the
/// watch loop never stalls on it.
#[derive(Debug)]
pub struct CommandSwitcher {
    argv: Vec<String>,
    timeout: Duration,
}

/// How often a running layout command is checked for exit
const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(10);

impl CommandSwitcher {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Result<Self, WatcherError> {
        if argv.is_empty() {
            return Err(WatcherError::InvalidConfig(
                "layout command is empty".to_string(),
            ));
        }
        Ok(Self { argv, timeout })
    }

    /// argv with the placeholder substituted
    pub fn command_line(&self, layout: &str) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| arg.replace(LAYOUT_PLACEHOLDER, layout))
            .collect()
    }
}

impl LayoutSwitcher for CommandSwitcher {
    fn switch_to(&mut self, layout: &str) -> Result<(), WatcherError> {
        let failed = |reason: String| WatcherError::LayoutSwitch {
            layout: layout.to_string(),
            reason,
        };

        let argv = self.command_line(layout);
        let Some((program, args)) = argv.split_first() else {
            return Err(WatcherError::InvalidConfig(
                "layout command is empty".to_string(),
            ));
        };
        debug!("Running {:?}", argv);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failed(format!("failed to run {program}: {e}")))?;

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    child.kill().ok();
                    child.wait().ok();
                    return Err(failed(format!(
                        "{program} did not finish within {} ms",
                        self.timeout.as_millis()
                    )));
                }
                Ok(None) => thread::sleep(COMMAND_POLL_INTERVAL),
                Err(e) => return Err(failed(format!("failed to wait for {program}: {e}"))),
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                pipe.read_to_string(&mut stderr).ok();
            }
            return Err(failed(format!(
                "{program} exited with {status}: {}",
                stderr.trim()
            )));
        }
        info!("Keyboard layout -> {layout}");
        Ok(())
    }
}

/// Loads the layout and asks the foreground window to adopt it
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct WindowsSwitcher;

#[cfg(windows)]
impl LayoutSwitcher for WindowsSwitcher {
    fn switch_to(&mut self, layout: &str) -> Result<(), WatcherError> {
        use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
            LoadKeyboardLayoutA, KLF_ACTIVATE, KLF_SUBSTITUTE_OK,
        };
        use windows_sys::Win32::UI::WindowsAndMessaging::{
            GetForegroundWindow, PostMessageA, WM_INPUTLANGCHANGEREQUEST,
        };

        let failed = |reason: &str| WatcherError::LayoutSwitch {
            layout: layout.to_string(),
            reason: reason.to_string(),
        };

        let klid = format!("{:08x}\0", parse_layout_id(layout)?);

        // SAFETY: plain Win32 calls; `klid` is NUL-terminated and outlives the call
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_null() {
                return Err(failed("no foreground window"));
            }
            let hkl = LoadKeyboardLayoutA(klid.as_ptr(), KLF_ACTIVATE | KLF_SUBSTITUTE_OK);
            if hkl.is_null() {
                return Err(failed("LoadKeyboardLayoutA failed"));
            }
            if PostMessageA(hwnd, WM_INPUTLANGCHANGEREQUEST, 0, hkl as isize) == 0 {
                return Err(failed("PostMessageA failed"));
            }
        }

        info!("Keyboard layout -> {layout}");
        Ok(())
    }
}
