use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace, warn};
use ttp_transport::PortalStream;
use ttp_wire::{Packet, PacketReader, PacketWriter, WireError};

use crate::channel::Channel;
use crate::error::{PortalError, Result};

/// Lifecycle of the selector worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SelectorState {
    /// Created, worker not yet launched.
    New = 0,
    /// Worker cycling.
    Running = 1,
    /// Stop requested; worker draining outbound queues.
    Stopping = 2,
    /// Worker exited.
    Stopped = 3,
}

impl SelectorState {
    fn from_u8(v: u8) -> SelectorState {
        match v {
            0 => SelectorState::New,
            1 => SelectorState::Running,
            2 => SelectorState::Stopping,
            _ => SelectorState::Stopped,
        }
    }
}

/// The worker that owns stream I/O on behalf of all channels.
///
/// One cycle visits every channel in ascending id order, writing at most
/// one outbound packet (prefixed by its routing frame) and then
/// opportunistically reading one logical packet. On stop, the worker
/// keeps cycling until no channel holds outbound packets, so nothing
/// enqueued before `stop()` is silently dropped.
pub(crate) struct Selector {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    channels: Arc<[Channel]>,
    state: AtomicU8,
    cycles: AtomicU64,
    park: Mutex<()>,
    stopped: Condvar,
}

impl Shared {
    fn state(&self) -> SelectorState {
        SelectorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_stopped(&self) {
        let _guard = self.park.lock().unwrap();
        self.state.store(SelectorState::Stopped as u8, Ordering::Release);
        self.stopped.notify_all();
    }
}

impl Selector {
    pub(crate) fn new(channels: Arc<[Channel]>) -> Self {
        Self {
            shared: Arc::new(Shared {
                channels,
                state: AtomicU8::new(SelectorState::New as u8),
                cycles: AtomicU64::new(0),
                park: Mutex::new(()),
                stopped: Condvar::new(),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Launch the worker. A second call is a no-op.
    pub(crate) fn start(
        &self,
        reader: PacketReader<PortalStream>,
        writer: PacketWriter<PortalStream>,
    ) -> Result<()> {
        if self
            .shared
            .state
            .compare_exchange(
                SelectorState::New as u8,
                SelectorState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("ttp-selector".into())
            .spawn(move || run(&shared, reader, writer));
        match spawned {
            Ok(handle) => {
                *self.worker.lock().unwrap() = Some(handle);
                Ok(())
            }
            Err(err) => {
                // No worker will ever run; don't leave stop() waiting.
                self.shared.set_stopped();
                Err(err.into())
            }
        }
    }

    /// Request a stop and block until the worker has drained and exited.
    /// Idempotent; concurrent callers all return once the state reaches
    /// `Stopped`.
    pub(crate) fn stop(&self) {
        // Never started: nothing to drain.
        if self
            .shared
            .state
            .compare_exchange(
                SelectorState::New as u8,
                SelectorState::Stopped as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            self.shared.set_stopped();
            return;
        }

        let _ = self.shared.state.compare_exchange(
            SelectorState::Running as u8,
            SelectorState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }

        let mut guard = self.shared.park.lock().unwrap();
        while self.shared.state() != SelectorState::Stopped {
            guard = self.shared.stopped.wait(guard).unwrap();
        }
    }

    pub(crate) fn state(&self) -> SelectorState {
        self.shared.state()
    }

    /// Cycles completed so far.
    pub(crate) fn cycles(&self) -> u64 {
        self.shared.cycles.load(Ordering::Relaxed)
    }
}

fn run(shared: &Shared, mut reader: PacketReader<PortalStream>, mut writer: PacketWriter<PortalStream>) {
    debug!(channels = shared.channels.len(), "selector running");
    let mut reads_ok = true;

    'worker: loop {
        let running = reads_ok && shared.state() == SelectorState::Running;
        let draining = shared.channels.iter().any(|ch| ch.output_size() > 0);
        if !running && !draining {
            break;
        }

        shared.cycles.fetch_add(1, Ordering::Relaxed);
        for channel in shared.channels.iter() {
            if let Err(err) = output(&mut writer, channel) {
                warn!(channel = channel.id(), %err, "outbound write failed");
            }
            if !reads_ok {
                continue;
            }
            match input(&mut reader, &shared.channels) {
                Ok(()) => {}
                // Clean peer closure; keep cycling so the drain finishes.
                Err(PortalError::Wire(WireError::EndOfStream)) => {}
                Err(err @ PortalError::InvalidRouting { .. }) => {
                    error!(%err, "protocol violation, selector exiting");
                    break 'worker;
                }
                Err(err) => {
                    warn!(%err, "inbound stream failed, draining outbound");
                    reads_ok = false;
                }
            }
        }
    }

    debug!(cycles = shared.cycles.load(Ordering::Relaxed), "selector stopped");
    shared.set_stopped();
}

/// Flush at most one outbound packet from `channel`.
///
/// The routing frame, the payload frame, and the flush form one unit:
/// no other channel's bytes are interleaved within them.
fn output(writer: &mut PacketWriter<PortalStream>, channel: &Channel) -> Result<()> {
    let Some(p) = channel.get() else {
        return Ok(());
    };
    writer.write_packet(&Packet::of_int(channel.id() as i32))?;
    writer.write_packet(&p)?;
    writer.flush()?;
    trace!(channel = channel.id(), "outbound packet written");
    Ok(())
}

/// Opportunistically read one logical packet and route it.
///
/// Returns without error when the polling window elapses with no data.
/// Once a routing frame has arrived the payload read blocks: the peer
/// sends both frames contiguously.
fn input(reader: &mut PacketReader<PortalStream>, channels: &Arc<[Channel]>) -> Result<()> {
    let Some(routing) = reader.poll_packet()? else {
        return Ok(());
    };
    let body = routing.format();
    let id: usize = body.parse().map_err(|_| PortalError::InvalidRouting {
        id: body.clone(),
        count: channels.len(),
    })?;

    let payload = reader.read_packet()?;

    let channel = channels.get(id).ok_or(PortalError::InvalidRouting {
        id: body,
        count: channels.len(),
    })?;
    channel.put(payload);
    trace!(channel = id, "inbound packet routed");
    Ok(())
}
