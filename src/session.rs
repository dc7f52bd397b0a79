//! TCP session transport: one JSON request per line, one JSON response per
//! line, strictly alternating. Operation 6 ends the session without a reply.

use std::io;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines,
};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::dispatch::{DispatchError, Dispatcher, Reply, Request, Response};

/// Accept sessions forever, one task per connection.
pub async fn serve(listener: TcpListener, dispatcher: Arc<Dispatcher>) -> io::Result<()> {
    info!("Session server listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = listener.accept().await?;
        info!("We have a visitor: {peer}");
        let dispatcher = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            match handle_session(stream, dispatcher).await {
                Ok(()) => info!("session {peer} closed"),
                Err(err) => warn!("session {peer} ended: {err}"),
            }
        });
    }
}

/// Longest request line accepted, newline included.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

enum Frame {
    Line,
    TooLong,
    Eof,
}

/// Read one newline-terminated frame into `buf`, reading at most `limit`
/// bytes. A final line without a newline still counts as a frame.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = (&mut *reader).take(limit as u64).read_until(b'\n', buf).await?;
    if n == 0 {
        Ok(Frame::Eof)
    } else if buf.ends_with(b"\n") || n < limit {
        Ok(Frame::Line)
    } else {
        Ok(Frame::TooLong)
    }
}

/// Discard input up to and including the next newline without buffering it.
async fn skip_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(());
        }
        match chunk.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = chunk.len();
                reader.consume(len);
            }
        }
    }
}

async fn write_response(writer: &mut OwnedWriteHalf, response: &Response) -> io::Result<()> {
    let mut body = serde_json::to_string(response)?;
    body.push('\n');
    writer.write_all(body.as_bytes()).await?;
    writer.flush().await
}

/// Serve one connection until the peer disconnects or hangs up.
pub async fn handle_session(stream: TcpStream, dispatcher: Arc<Dispatcher>) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        match read_frame(&mut reader, &mut buf, MAX_LINE_BYTES).await? {
            Frame::Eof => break,
            Frame::TooLong => {
                skip_line(&mut reader).await?;
                let err = DispatchError::TooLarge {
                    limit: MAX_LINE_BYTES,
                };
                warn!("rejected request: {err}");
                write_response(&mut writer, &Response::from(err)).await?;
                continue;
            }
            Frame::Line => {}
        }

        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(err) => {
                warn!("rejected request: {err}");
                write_response(&mut writer, &DispatchError::NotUtf8(err).into()).await?;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        debug!("received {}", line.trim_end());

        // Mining is CPU-bound; keep it off the reactor.
        let dispatcher = Arc::clone(&dispatcher);
        let reply = tokio::task::spawn_blocking(move || dispatcher.handle_raw(line.trim_end()))
            .await
            .map_err(io::Error::other)?;

        match reply {
            Reply::Disconnect => break,
            Reply::Respond(response) => write_response(&mut writer, &response).await?,
        }
    }
    let _ = writer.shutdown().await;
    Ok(())
}

/// Client side of a session.
#[derive(Debug)]
pub struct SessionClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl SessionClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Send one request and wait for its response. Returns `None` once a
    /// disconnect request has been sent.
    pub async fn send(&mut self, request: &Request) -> io::Result<Option<Response>> {
        let mut body = request
            .encode()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        body.push('\n');
        self.writer.write_all(body.as_bytes()).await?;
        self.writer.flush().await?;

        if *request == Request::Disconnect {
            let _ = self.writer.shutdown().await;
            return Ok(None);
        }

        match self.lines.next_line().await? {
            Some(line) => Ok(Some(serde_json::from_str(&line)?)),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the session",
            )),
        }
    }
}
