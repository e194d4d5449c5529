use crate::error::{TransferError, TransportError};
use crate::session::{FileChannel, SessionHandle, Transport};
use log::debug;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Copy one file over a fresh SFTP sub-channel, via a sibling `.part` file.
pub fn download<T: Transport>(
    handle: &mut SessionHandle<T>,
    remote: &str,
    local: &Path,
) -> Result<u64, TransferError> {
    let transport = handle.transport_mut().map_err(to_transfer_error)?;
    let mut files = transport.open_file_channel().map_err(to_transfer_error)?;

    let partial = partial_path(local);
    let copied = copy_remote(&mut files, remote, &partial);
    drop(files);

    match copied {
        Ok(bytes) => {
            if let Err(e) = fs::rename(&partial, local) {
                let _ = fs::remove_file(&partial);
                return Err(TransferError {
                    detail: format!("unable to move download into {}: {}", local.display(), e),
                });
            }
            debug!("downloaded {} ({} bytes) to {}", remote, bytes, local.display());
            Ok(bytes)
        }
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn copy_remote<F: FileChannel>(
    files: &mut F,
    remote: &str,
    partial: &Path,
) -> Result<u64, TransferError> {
    let mut source = files.open_remote(remote).map_err(|e| TransferError {
        detail: format!("{}: {}", remote, e),
    })?;
    let file = File::create(partial).map_err(|e| TransferError {
        detail: format!("unable to create {}: {}", partial.display(), e),
    })?;
    let mut writer = BufWriter::new(file);
    let bytes = io::copy(&mut source, &mut writer).map_err(|e| TransferError {
        detail: format!("transfer of {} interrupted: {}", remote, e),
    })?;
    writer.flush().map_err(|e| TransferError {
        detail: format!("unable to write {}: {}", partial.display(), e),
    })?;
    Ok(bytes)
}

fn partial_path(local: &Path) -> PathBuf {
    let mut name = local.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    local.with_file_name(name)
}

fn to_transfer_error(e: TransportError) -> TransferError {
    TransferError {
        detail: e.to_string(),
    }
}
