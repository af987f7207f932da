use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

use ttp_wire::Packet;

/// A logical conversation multiplexed over a shared stream.
///
/// A channel holds two unbounded FIFO queues: `outbound` (application to
/// selector) and `inbound` (selector to application). Applications
/// enqueue with [`send`] and drain with [`receive`]; the two await
/// primitives block on queue state and wake whenever the selector moves
/// packets through. There is no back-pressure beyond those waits.
///
/// All operations are safe to call from multiple threads. Wake-ups may
/// be spurious — awaiters re-check their predicate, and after the owning
/// portal closes, awaits return with the predicate possibly unmet, so
/// callers should re-check `portal.is_closed()`.
///
/// [`send`]: Channel::send
/// [`receive`]: Channel::receive
pub struct Channel {
    id: usize,
    outbound: Buffer,
    inbound: Buffer,
    released: AtomicBool,
}

impl Channel {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            outbound: Buffer::new(),
            inbound: Buffer::new(),
            released: AtomicBool::new(false),
        }
    }

    /// Channel id, unique within its portal.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Enqueue a packet for the selector to write. Never blocks.
    pub fn send(&self, p: Packet) {
        self.outbound.push(p);
    }

    /// Dequeue the next received packet, or `None` if the inbound queue
    /// is empty. Never blocks.
    pub fn receive(&self) -> Option<Packet> {
        self.inbound.pop()
    }

    /// Non-destructive look at the head of the inbound queue.
    pub fn peek(&self) -> Option<Packet> {
        self.inbound.peek()
    }

    /// Block until every packet enqueued with [`send`] has been taken by
    /// the selector.
    ///
    /// [`send`]: Channel::send
    pub fn await_output(&self) {
        self.outbound.await_empty(&self.released);
    }

    /// Block until the inbound queue is nonempty.
    pub fn await_input(&self) {
        self.inbound.await_nonempty(&self.released);
    }

    /// Number of packets waiting for the selector. Stale the moment it
    /// returns.
    pub fn output_size(&self) -> usize {
        self.outbound.len()
    }

    /// Number of packets waiting for the application. Stale the moment
    /// it returns.
    pub fn input_size(&self) -> usize {
        self.inbound.len()
    }

    /// Selector side: dequeue one packet to put on the wire, waking
    /// `await_output` waiters.
    pub(crate) fn get(&self) -> Option<Packet> {
        self.outbound.pop()
    }

    /// Selector side: deposit one packet read off the wire, waking
    /// `await_input` waiters.
    pub(crate) fn put(&self, p: Packet) {
        self.inbound.push(p);
    }

    /// Release all waiters; called when the owning portal closes.
    pub(crate) fn release(&self) {
        self.released.store(true, Ordering::Release);
        self.outbound.wake_all();
        self.inbound.wake_all();
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("outbound", &self.outbound.len())
            .field("inbound", &self.inbound.len())
            .finish()
    }
}

/// One FIFO packet queue with condition-variable notification.
struct Buffer {
    packets: Mutex<VecDeque<Packet>>,
    signal: Condvar,
}

impl Buffer {
    fn new() -> Self {
        Self {
            packets: Mutex::new(VecDeque::new()),
            signal: Condvar::new(),
        }
    }

    fn push(&self, p: Packet) {
        let mut q = self.packets.lock().unwrap();
        q.push_back(p);
        self.signal.notify_all();
    }

    fn pop(&self) -> Option<Packet> {
        let mut q = self.packets.lock().unwrap();
        let p = q.pop_front();
        self.signal.notify_all();
        p
    }

    fn peek(&self) -> Option<Packet> {
        self.packets.lock().unwrap().front().cloned()
    }

    fn len(&self) -> usize {
        self.packets.lock().unwrap().len()
    }

    fn await_empty(&self, released: &AtomicBool) {
        let mut q = self.packets.lock().unwrap();
        while !q.is_empty() && !released.load(Ordering::Acquire) {
            q = self.signal.wait(q).unwrap();
        }
    }

    fn await_nonempty(&self, released: &AtomicBool) {
        let mut q = self.packets.lock().unwrap();
        while q.is_empty() && !released.load(Ordering::Acquire) {
            q = self.signal.wait(q).unwrap();
        }
    }

    fn wake_all(&self) {
        // Lock so the flag store cannot race a waiter between its
        // predicate check and its wait.
        let _q = self.packets.lock().unwrap();
        self.signal.notify_all();
    }
}
