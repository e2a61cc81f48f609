//! Win32 implementation of [`ProcessPlatform`].

use crate::services::affinity::AffinityMask;
use crate::services::error::{ControlError, PrivilegeStage, Result};
use crate::services::platform::ProcessPlatform;
use log::{debug, trace};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_NOT_ALL_ASSIGNED, HANDLE, LUID};
use windows::Win32::Security::{
    AdjustTokenPrivileges, LookupPrivilegeValueW, LUID_AND_ATTRIBUTES, SE_DEBUG_NAME, SE_PRIVILEGE_ENABLED,
    TOKEN_ADJUST_PRIVILEGES, TOKEN_PRIVILEGES, TOKEN_QUERY,
};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{
    GetActiveProcessorCount, GetCurrentProcess, OpenProcess, OpenProcessToken, SetProcessAffinityMask,
    PROCESS_ALL_ACCESS,
};

#[link(name = "ntdll")]
extern "system" {
    fn NtSuspendProcess(process_handle: HANDLE) -> i32;
}

/// Win32 error code behind a `windows` error, unwrapping HRESULT_FROM_WIN32.
fn os_code(error: &windows::core::Error) -> u32 {
    let hr = error.code().0 as u32;
    if hr & 0xFFFF_0000 == 0x8007_0000 {
        hr & 0xFFFF
    } else {
        hr
    }
}

/// Plain kernel handle closed on drop (snapshots, tokens).
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

pub struct Win32Platform;

impl Win32Platform {
    /// Executable name stored in a snapshot entry.
    #[inline]
    fn exe_name(sz_exe_file: &[u16; 260]) -> String {
        let len = sz_exe_file.iter().position(|&c| c == 0).unwrap_or(sz_exe_file.len());
        String::from_utf16_lossy(&sz_exe_file[..len])
    }
}

impl ProcessPlatform for Win32Platform {
    type Handle = HANDLE;

    fn locate_by_name(&self, name: &str) -> Result<u32> {
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
                .map_err(|e| ControlError::Snapshot { code: os_code(&e) })?;
            let snapshot = OwnedHandle(snapshot);

            let mut entry = PROCESSENTRY32W {
                dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
                ..Default::default()
            };

            if Process32FirstW(snapshot.0, &mut entry).is_ok() {
                loop {
                    if Self::exe_name(&entry.szExeFile).eq_ignore_ascii_case(name) {
                        trace!("{} is pid {}", name, entry.th32ProcessID);
                        return Ok(entry.th32ProcessID);
                    }
                    if Process32NextW(snapshot.0, &mut entry).is_err() {
                        break;
                    }
                }
            }
        }
        Err(ControlError::not_found(name))
    }

    fn elevate(&self) -> Result<()> {
        unsafe {
            let mut token = HANDLE::default();
            OpenProcessToken(GetCurrentProcess(), TOKEN_ADJUST_PRIVILEGES | TOKEN_QUERY, &mut token).map_err(|e| {
                ControlError::Privilege { stage: PrivilegeStage::OpenToken, code: os_code(&e) }
            })?;
            let token = OwnedHandle(token);

            let mut luid = LUID::default();
            LookupPrivilegeValueW(PCWSTR::null(), SE_DEBUG_NAME, &mut luid).map_err(|e| {
                ControlError::Privilege { stage: PrivilegeStage::LookupValue, code: os_code(&e) }
            })?;

            let privileges = TOKEN_PRIVILEGES {
                PrivilegeCount: 1,
                Privileges: [LUID_AND_ATTRIBUTES { Luid: luid, Attributes: SE_PRIVILEGE_ENABLED }],
            };
            AdjustTokenPrivileges(token.0, false, Some(&privileges as *const _), 0, None, None).map_err(|e| {
                ControlError::Privilege { stage: PrivilegeStage::Adjust, code: os_code(&e) }
            })?;

            // Success with ERROR_NOT_ALL_ASSIGNED means the token lacks the privilege
            let last = GetLastError();
            if last == ERROR_NOT_ALL_ASSIGNED {
                return Err(ControlError::Privilege { stage: PrivilegeStage::Adjust, code: last.0 });
            }
        }
        debug!("debug privilege enabled");
        Ok(())
    }

    fn open_full(&self, pid: u32) -> Result<HANDLE> {
        unsafe {
            OpenProcess(PROCESS_ALL_ACCESS, false, pid)
                .map_err(|e| ControlError::OpenProcess { pid, code: os_code(&e) })
        }
    }

    fn set_affinity(&self, handle: &HANDLE, pid: u32, mask: AffinityMask) -> Result<()> {
        unsafe {
            SetProcessAffinityMask(*handle, mask.bits())
                .map_err(|e| ControlError::SetAffinity { pid, code: os_code(&e) })
        }
    }

    fn suspend(&self, handle: &HANDLE, pid: u32) -> Result<()> {
        let status = unsafe { NtSuspendProcess(*handle) };
        if status != 0 {
            return Err(ControlError::Suspend { pid, status });
        }
        Ok(())
    }

    fn close(&self, handle: HANDLE) {
        unsafe {
            let _ = CloseHandle(handle);
        }
    }

    fn logical_cpu_count(&self) -> usize {
        // Affinity masks address the primary processor group only
        unsafe { GetActiveProcessorCount(0) as usize }
    }
}
