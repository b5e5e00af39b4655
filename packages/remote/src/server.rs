//! The server dispatcher.
//!
//! One sequential accept loop serves the authoritative filesystem: each
//! inbound connection carries exactly one request frame, gets dispatched
//! against the tree, receives a response frame when the command returns
//! a value, and is closed. A failing request is logged to a durable
//! error log and the loop continues; nothing a client sends terminates
//! the server.

use std::io::Write as _;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;

use treefs_core::{Error, FileSystem, TreeOps};
use treefs_wire::{recv_frame, send_frame, Command, Request};

pub struct Server {
    fs: Arc<FileSystem>,
    listener: TcpListener,
    error_log: Option<PathBuf>,
}

impl Server {
    /// Bind the listening socket once. `addr` may use port 0 to let the
    /// OS pick.
    pub fn bind(addr: &str, fs: Arc<FileSystem>) -> Result<Self, Error> {
        let listener =
            TcpListener::bind(addr).map_err(|e| Error::transport(format!("{}: {}", addr, e)))?;
        Ok(Server {
            fs,
            listener,
            error_log: None,
        })
    }

    /// Append per-request errors to this file, timestamped.
    pub fn with_error_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_log = Some(path.into());
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        self.listener
            .local_addr()
            .map_err(|e| Error::transport(e.to_string()))
    }

    /// Serve connections forever, one request at a time.
    pub fn run(&self) -> ! {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    log::debug!("serving {}", peer);
                    if let Err(e) = self.serve_one(stream) {
                        self.log_error(&e);
                    }
                }
                Err(e) => self.log_error(&Error::transport(format!("accept: {}", e))),
            }
        }
    }

    /// Serve exactly one connection: one request, at most one response.
    pub fn serve_one(&self, mut stream: TcpStream) -> Result<(), Error> {
        let payload = recv_frame(&mut stream)?;
        let request = Request::decode(&payload)?;
        if let Some(response) = self.dispatch(&request)? {
            send_frame(&mut stream, &response);
        }
        Ok(())
    }

    /// Route a request to the tree and encode its result.
    fn dispatch(&self, req: &Request) -> Result<Option<Vec<u8>>, Error> {
        let fs = &self.fs;
        match req.command {
            Command::ChangeDirectory => json(&fs.change_directory(req.arg(0)?)?),
            Command::CreateDirectory => {
                fs.create_directory(req.arg(0)?)?;
                Ok(None)
            }
            Command::Move => {
                fs.move_node(req.arg(0)?, req.arg(1)?)?;
                Ok(None)
            }
            Command::Delete => {
                fs.delete(req.arg(0)?)?;
                Ok(None)
            }
            Command::Save => {
                fs.save()?;
                Ok(None)
            }
            Command::MemoryMap => json(&fs.memory_map()?),
            Command::Root => json(&fs.root()?),
            Command::Current => json(&fs.current()?),
            Command::CreateFile => {
                fs.create_file_in(req.arg(0)?, req.arg(1)?)?;
                Ok(None)
            }
            Command::OpenFile => json(&fs.open_file_in(req.arg(0)?, req.arg(1)?, req.arg(2)?)?),
            Command::DeleteFile => {
                fs.delete_file_in(req.arg(0)?, req.arg(1)?)?;
                Ok(None)
            }
            Command::WriteContents => {
                let raw_append = req.arg(4)?;
                let append: bool = raw_append.parse().map_err(|_| {
                    Error::invalid_arguments(format!("'{}' is not a bool", raw_append))
                })?;
                fs.write_contents(
                    req.arg(0)?,
                    req.arg(1)?,
                    req.arg(2)?.as_bytes(),
                    req.int_arg(3)?,
                    append,
                )?;
                Ok(None)
            }
            Command::ReadContents => json(&fs.read_contents(
                req.arg(0)?,
                req.arg(1)?,
                req.int_arg(2)?,
                req.int_arg(3)?,
            )?),
            Command::MoveContents => {
                fs.move_contents(
                    req.arg(0)?,
                    req.arg(1)?,
                    req.int_arg(2)?,
                    req.int_arg(3)?,
                    req.int_arg(4)?,
                )?;
                Ok(None)
            }
            Command::TruncateContents => {
                fs.truncate_contents(req.arg(0)?, req.arg(1)?, req.int_arg(2)?)?;
                Ok(None)
            }
        }
    }

    fn log_error(&self, e: &Error) {
        log::error!("request failed: {}", e);
        let Some(path) = &self.error_log else {
            return;
        };
        let line = format!("[{}] ERROR: {}\n", chrono::Local::now(), e);
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(line.as_bytes()));
        if let Err(io_err) = result {
            log::error!("error log {} unwritable: {}", path.display(), io_err);
        }
    }
}

fn json<T: serde::Serialize>(value: &T) -> Result<Option<Vec<u8>>, Error> {
    Ok(Some(serde_json::to_vec(value).map_err(|e| {
        Error::transport(format!("response encoding: {}", e))
    })?))
}
