use crate::{Result, error::GpsdWatchError};

#[cfg(feature = "proto-v3")]
pub mod v3;

/// A client-to-daemon command in GPSD's `?NAME=json;` wire form
pub trait GpsdRequest {
    fn to_command(&self) -> String;
}

/// Extension trait for writing GPSD commands to an async sink
pub trait GpsdJsonEncodeAsync: futures_io::AsyncWrite + Unpin {
    fn write_request(
        &mut self,
        request: &impl GpsdRequest,
    ) -> impl std::future::Future<Output = Result<()>> {
        async move {
            use futures_util::AsyncWriteExt;

            let cmd = request.to_command();
            self.write_all(cmd.as_bytes())
                .await
                .map_err(GpsdWatchError::IoError)?;
            self.flush().await.map_err(GpsdWatchError::IoError)
        }
    }
}

impl<W: futures_io::AsyncWrite + Unpin> GpsdJsonEncodeAsync for W {}
