//! Multi-channel example — two conversations share one connection.
//!
//! Run with:
//!   cargo run --example multi-channel

use std::thread;

use ttp::portal::{connect, PortalListener};
use ttp::wire::Packet;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = PortalListener::bind("127.0.0.1:0".parse()?)?.with_channel_count(2);
    let addr = listener.local_addr();

    let server = thread::spawn(move || -> Result<(), ttp::portal::PortalError> {
        let portal = listener.accept()?;
        eprintln!("[server] portal connected: {}", portal.name());

        // Echo one packet on each channel.
        for i in 0..2 {
            let ch = portal.channel(i);
            ch.await_input();
            let packet = ch.receive().expect("await_input saw a packet");
            eprintln!("[server] channel {i} received {packet}");
            ch.send(packet);
            ch.await_output();
        }
        portal.close()?;
        Ok(())
    });

    let client = connect(addr, 2)?;
    client.channel(0).send(Packet::of_int(42));
    client.channel(1).send(Packet::of_string("bulk payload"));

    for i in 0..2 {
        let ch = client.channel(i);
        ch.await_input();
        eprintln!("[client] channel {i} reply: {}", ch.receive().unwrap());
    }
    client.close()?;

    server.join().expect("server thread should not panic")?;
    Ok(())
}
