//! Packet analysis cache and query surface.
//!
//! One [`PacketAnalysis`] instance exists per loaded binary. Packet
//! resolution and IR synthesis are pure functions of the immutable
//! instruction stream, so the cache takes a short-held lock only around
//! entry insertion, never around the decode or synthesis work itself;
//! threads computing different packets do not serialize, and two
//! threads racing on the same packet end with one result installed and
//! the other discarding its redundant copy.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use packray_core::LoopEnd;

use crate::error::PacketResult;
use crate::ir::PacketIr;
use crate::packet::{self, Packet};
use crate::source::InstructionSource;
use crate::synthesize;

/// Memoized packet analysis results, keyed by packet start address,
/// with a secondary index from every member address to its owning
/// packet start.
#[derive(Debug, Default)]
struct PacketCache {
    packets: RwLock<HashMap<u64, Arc<Packet>>>,
    members: RwLock<HashMap<u64, u64>>,
    ir: RwLock<HashMap<u64, Arc<PacketIr>>>,
}

impl PacketCache {
    /// Constant-time lookup through the member index.
    fn cached_packet(&self, address: u64) -> Option<Arc<Packet>> {
        let start = *self.members.read().unwrap().get(&address)?;
        self.packets.read().unwrap().get(&start).cloned()
    }

    /// Installs a computed packet; the first writer wins and later
    /// racers receive the already-installed copy.
    fn install_packet(&self, packet: Arc<Packet>) -> Arc<Packet> {
        let mut packets = self.packets.write().unwrap();
        let installed = packets
            .entry(packet.start)
            .or_insert_with(|| Arc::clone(&packet))
            .clone();
        drop(packets);

        let mut members = self.members.write().unwrap();
        for entry in &installed.entries {
            members.insert(entry.insn.address, installed.start);
        }
        installed
    }

    fn cached_ir(&self, start: u64) -> Option<Arc<PacketIr>> {
        self.ir.read().unwrap().get(&start).cloned()
    }

    fn install_ir(&self, ir: Arc<PacketIr>) -> Arc<PacketIr> {
        self.ir
            .write()
            .unwrap()
            .entry(ir.start)
            .or_insert_with(|| Arc::clone(&ir))
            .clone()
    }

    /// Drops every packet with a member in the half-open range
    /// `[lo, hi)`. No partial patching: affected packets are recomputed
    /// from scratch on the next query.
    fn invalidate_range(&self, lo: u64, hi: u64) {
        let starts: Vec<u64> = {
            let members = self.members.read().unwrap();
            members
                .iter()
                .filter(|(address, _)| **address >= lo && **address < hi)
                .map(|(_, start)| *start)
                .collect()
        };

        let mut packets = self.packets.write().unwrap();
        let mut members = self.members.write().unwrap();
        let mut ir = self.ir.write().unwrap();
        for start in starts {
            if let Some(packet) = packets.remove(&start) {
                for entry in &packet.entries {
                    members.remove(&entry.insn.address);
                }
            }
            ir.remove(&start);
        }
    }
}

/// Per-binary packet analysis context.
///
/// Explicitly constructed and passed to whichever component needs it;
/// its lifetime is the binary's analysis session. All queries are safe
/// to call concurrently.
#[derive(Debug)]
pub struct PacketAnalysis<S> {
    source: S,
    cache: PacketCache,
}

impl<S: InstructionSource> PacketAnalysis<S> {
    /// Creates an analysis context over a front-end source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: PacketCache::default(),
        }
    }

    /// The underlying front-end source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolves the packet containing `address`, memoized.
    pub fn resolve_packet(&self, address: u64) -> PacketResult<Arc<Packet>> {
        if let Some(packet) = self.cache.cached_packet(address) {
            return Ok(packet);
        }
        // Decode outside any lock.
        let packet = packet::resolve(&self.source, address)?;
        Ok(self.cache.install_packet(Arc::new(packet)))
    }

    /// The combined parallel-semantics IR for the packet containing
    /// `address`, memoized by packet start.
    pub fn packet_ir(&self, address: u64) -> PacketResult<Arc<PacketIr>> {
        let packet = self.resolve_packet(address)?;
        if let Some(ir) = self.cache.cached_ir(packet.start) {
            return Ok(ir);
        }
        let ir = synthesize::synthesize(&packet)?;
        Ok(self.cache.install_ir(Arc::new(ir)))
    }

    /// Listing prefix for the instruction at `address`: `"{"` when it
    /// opens a packet, `" "` otherwise.
    ///
    /// When no packet boundary can be resolved the instruction is
    /// reported as an unpacketized singleton so the host can still
    /// display something.
    pub fn mnemonic_prefix(&self, address: u64) -> &'static str {
        match self.resolve_packet(address) {
            Ok(packet) if packet.start == address => "{",
            Ok(_) => " ",
            Err(_) => "{",
        }
    }

    /// Listing suffix for the instruction at `address`: `"}"` (plus an
    /// `:endloopN` tag for loop-closing packets) when it closes a
    /// packet, `" "` otherwise.
    pub fn mnemonic_suffix(&self, address: u64) -> &'static str {
        match self.resolve_packet(address) {
            Ok(packet) if packet.end == address => match packet.loop_end {
                LoopEnd::None => "}",
                LoopEnd::Loop0 => "}:endloop0",
                LoopEnd::Loop1 => "}:endloop1",
            },
            Ok(_) => " ",
            Err(_) => "}",
        }
    }

    /// Returns true if the instruction at `address` is the last of its
    /// parallel execution group.
    pub fn is_end_of_parallel_group(&self, address: u64) -> bool {
        match self.resolve_packet(address) {
            Ok(packet) => packet.end == address,
            // Unpacketized singleton.
            Err(_) => true,
        }
    }

    /// Drops cached results for every packet overlapping `[lo, hi)`.
    ///
    /// Call after re-disassembly of that region; nothing else in the
    /// cache is touched.
    pub fn invalidate_range(&self, lo: u64, hi: u64) {
        self.cache.invalidate_range(lo, hi);
    }
}
