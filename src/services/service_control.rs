use anyhow::Result;

/// Stopping services and killing processes, as the suspend mode needs.
pub trait ServiceControl {
    /// Asks the service control manager to stop `name`.
    /// Returns `false` when the service was not running.
    fn stop_service(&self, name: &str) -> Result<bool>;

    /// Force-terminates every process named `name`.
    fn kill_process(&self, name: &str) -> Result<()>;
}

#[cfg(windows)]
pub use self::win32::WindowsServiceManager;

#[cfg(windows)]
mod win32 {
    use super::ServiceControl;
    use anyhow::{bail, Context, Result};
    use log::{debug, info};
    use std::os::windows::process::CommandExt;
    use std::process::Command;
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::System::Services::{
        CloseServiceHandle, ControlService, OpenSCManagerW, OpenServiceW, QueryServiceStatus, SC_HANDLE,
        SC_MANAGER_CONNECT, SERVICE_CONTROL_STOP, SERVICE_QUERY_STATUS, SERVICE_RUNNING, SERVICE_STATUS,
        SERVICE_STOP,
    };

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    /// Closes a service control handle on drop.
    struct ScHandle(SC_HANDLE);

    impl Drop for ScHandle {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseServiceHandle(self.0);
            }
        }
    }

    pub struct WindowsServiceManager;

    impl ServiceControl for WindowsServiceManager {
        fn stop_service(&self, name: &str) -> Result<bool> {
            unsafe {
                let scm = ScHandle(OpenSCManagerW(None, None, SC_MANAGER_CONNECT).context("OpenSCManager failed")?);

                let name_w = HSTRING::from(name);
                let service = ScHandle(
                    OpenServiceW(scm.0, PCWSTR(name_w.as_ptr()), SERVICE_STOP | SERVICE_QUERY_STATUS)
                        .with_context(|| format!("failed to open service {}", name))?,
                );

                let mut status = SERVICE_STATUS::default();
                QueryServiceStatus(service.0, &mut status)
                    .with_context(|| format!("failed to query service {}", name))?;
                if status.dwCurrentState != SERVICE_RUNNING {
                    debug!("service {} is not running", name);
                    return Ok(false);
                }

                let mut new_status = SERVICE_STATUS::default();
                ControlService(service.0, SERVICE_CONTROL_STOP, &mut new_status)
                    .with_context(|| format!("failed to stop service {}", name))?;
                info!("stop requested for service {}", name);
                Ok(true)
            }
        }

        fn kill_process(&self, name: &str) -> Result<()> {
            let exe_name = if name.to_lowercase().ends_with(".exe") {
                name.to_string()
            } else {
                format!("{}.exe", name)
            };

            let status = Command::new("taskkill")
                .args(["/F", "/IM", &exe_name])
                .creation_flags(CREATE_NO_WINDOW)
                .status()
                .context("failed to run taskkill")?;
            if !status.success() {
                bail!("taskkill {} exited with {}", exe_name, status);
            }
            info!("terminated {}", exe_name);
            Ok(())
        }
    }
}
