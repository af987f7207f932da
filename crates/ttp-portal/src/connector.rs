use std::net::SocketAddr;

use ttp_transport::PortalStream;

use crate::direct::DirectPortal;
use crate::error::Result;
use crate::portal::MultiplexedPortal;

/// Connect to a listening peer as a multiplexed portal.
///
/// `channel_count` must match the count the peer accepted with; TTP
/// carries no negotiation.
pub fn connect(addr: SocketAddr, channel_count: usize) -> Result<MultiplexedPortal> {
    let stream = PortalStream::connect(addr)?;
    MultiplexedPortal::open(stream, format!("portal@{addr}"), channel_count)
}

/// Connect to a listening peer as a direct (singleplexed) portal.
pub fn connect_direct(addr: SocketAddr) -> Result<DirectPortal> {
    let stream = PortalStream::connect(addr)?;
    DirectPortal::open(stream, format!("portal@{addr}"))
}

#[cfg(test)]
mod tests {
    use std::thread;

    use ttp_wire::Packet;

    use super::*;
    use crate::listener::PortalListener;

    #[test]
    fn multiplexed_connect_and_echo() {
        let listener = PortalListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr();

        let server = thread::spawn(move || {
            let portal = listener.accept().unwrap();
            assert_eq!(portal.name(), "portal-1");
            let ch = portal.channel(0);
            ch.await_input();
            let p = ch.receive().unwrap();
            ch.send(p);
            ch.await_output();
            portal.close().unwrap();
        });

        let client = connect(addr, 1).unwrap();
        let reply = client.transfer(0, Packet::of_string("ping")).unwrap();
        assert_eq!(reply, Packet::of_string("ping"));

        server.join().unwrap();
        client.close().unwrap();
    }

    #[test]
    fn direct_connect_and_echo() {
        let listener = PortalListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr();

        let server = thread::spawn(move || {
            let mut portal = listener.accept_direct().unwrap();
            let p = portal.receive().unwrap();
            portal.send(&p).unwrap();
            portal.close().unwrap();
        });

        let mut client = connect_direct(addr).unwrap();
        let reply = client.transfer(&Packet::of_int(9)).unwrap();
        assert_eq!(reply, Packet::of_int(9));

        server.join().unwrap();
        client.close().unwrap();
    }

    #[test]
    fn closed_direct_portal_fails_operations() {
        let listener = PortalListener::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr();
        let server = thread::spawn(move || listener.accept_direct().unwrap());

        let mut client = connect_direct(addr).unwrap();
        client.close().unwrap();
        assert!(client.is_closed());
        assert!(matches!(
            client.send(&Packet::nop()),
            Err(crate::error::PortalError::Closed)
        ));
        drop(server.join().unwrap());
    }
}
