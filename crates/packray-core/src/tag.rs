//! Packet continuation tags.
//!
//! Every 32-bit word of the instruction stream carries a parse tag that
//! tells the packet boundary resolver whether the word continues or
//! terminates its packet. The bit positions the tag is read from are
//! architecture reference material owned by the disassembly front end;
//! this crate only consumes the decoded enum.

/// Per-word packet continuation tag, as reported by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseTag {
    /// The packet continues past this word.
    Continue,
    /// This word is the last of its packet.
    End,
    /// This word packs two sub-instructions and is the last of its packet.
    ///
    /// Duplex words are always the trailing word of a packet.
    Duplex,
    /// Last word of a packet that also closes hardware loop 0.
    EndLoop0,
    /// Last word of a packet that also closes hardware loop 1.
    EndLoop1,
}

impl ParseTag {
    /// Returns true if this word terminates its packet.
    pub fn ends_packet(&self) -> bool {
        !matches!(self, Self::Continue)
    }

    /// Returns the hardware loop this tag closes, if any.
    pub fn loop_end(&self) -> LoopEnd {
        match self {
            Self::EndLoop0 => LoopEnd::Loop0,
            Self::EndLoop1 => LoopEnd::Loop1,
            _ => LoopEnd::None,
        }
    }
}

/// Which hardware loop a packet closes, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopEnd {
    /// Not a loop-ending packet.
    #[default]
    None,
    /// Closes hardware loop 0.
    Loop0,
    /// Closes hardware loop 1.
    Loop1,
}

impl LoopEnd {
    /// Returns the listing suffix tag for this loop end (":endloop0" etc.).
    pub fn suffix_tag(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Loop0 => ":endloop0",
            Self::Loop1 => ":endloop1",
        }
    }
}
