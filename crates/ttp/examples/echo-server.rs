//! Minimal echo server — accepts one direct portal and echoes packets
//! back with an OK response header.
//!
//! Run with:
//!   cargo run --example echo-server

use std::thread;

use ttp::portal::{connect_direct, PortalListener};
use ttp::wire::{Header, Packet};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = PortalListener::bind("127.0.0.1:0".parse()?)?;
    let addr = listener.local_addr();
    eprintln!("Listening on {addr}");

    let server = thread::spawn(move || -> Result<(), ttp::portal::PortalError> {
        let mut portal = listener.accept_direct()?;
        eprintln!("[server] portal connected: {}", portal.name());

        loop {
            match portal.receive() {
                Ok(request) => {
                    eprintln!("[server] received {request}");
                    portal.send(&Packet::of(Header::Ok, &request.format(), request.footer()))?;
                }
                Err(e) => {
                    eprintln!("[server] portal disconnected: {e}");
                    break;
                }
            }
        }
        Ok(())
    });

    let mut client = connect_direct(addr)?;
    for text in ["hello", "tagged", "transfer"] {
        let reply = client.transfer(&Packet::of_string(text))?;
        eprintln!("[client] reply: {reply}");
    }
    client.close()?;

    server.join().expect("server thread should not panic")?;
    Ok(())
}
