use jobctl_core::OutputSink;
use jobctl_model::{OutputLine, OutputStream};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

/// Read `reader` line by line into `sink` until EOF.
///
/// Invalid UTF-8 is replaced lossily and the trailing `\n` or `\r\n` is dropped. A final line
/// without a newline is still delivered.
pub(super) async fn forward_lines<R>(reader: R, stream: OutputStream, sink: OutputSink)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(trim_newline(&buf)).into_owned();
                if sink.send(OutputLine { stream, text }).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(target: "jobctl.exec.proc", stream = stream.as_str(), error = %e, "read failed");
                break;
            }
        }
    }
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
