//! A mutable text buffer with index marks that survive in-place edits.
//!
//! Templates are expanded in place: every tag is replaced by its output inside
//! the same buffer the tokenizer is reading. Positions that must outlive an
//! edit (the tokenizer cursor, token boundaries, the end of a standalone line)
//! are held as [`Mark`]s. When a range is replaced, every live mark at or
//! after the end of that range is shifted by the change in length, so it keeps
//! pointing at the same logical character.
//!
//! Positions are byte offsets into the UTF-8 text and always fall on character
//! boundaries.
//!
//! # Example
//!
//! ```rust
//! use mustang::Buffer;
//!
//! let mut buffer = Buffer::new("Hello {{name}}!");
//! let bang = buffer.mark(14);
//!
//! buffer.replace_range(6, 14, "World");
//! assert_eq!(buffer.as_str(), "Hello World!");
//! assert_eq!(buffer.position(bang), Some(11));
//! assert_eq!(buffer.char_at(bang), Some('!'));
//! ```

/// A tracked position in a [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mark(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Index into `Buffer::live`.
    Live(usize),
    /// Frozen at its last position.
    Released(usize),
    Invalid,
}

/// Anything that names a position in a buffer: a raw offset or a [`Mark`].
pub trait Position: Copy {
    /// Resolves to a byte offset. Invalidated marks resolve to the end of the
    /// buffer.
    fn offset(self, buffer: &Buffer) -> usize;
}

impl Position for usize {
    fn offset(self, _buffer: &Buffer) -> usize {
        self
    }
}

impl Position for Mark {
    fn offset(self, buffer: &Buffer) -> usize {
        buffer.position(self).unwrap_or(buffer.len())
    }
}

/// Text that can be edited in place while keeping marks valid.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    text: String,
    marks: Vec<Slot>,
    /// Position and slot of every live mark. Edits only walk this list.
    live: Vec<(usize, usize)>,
}

impl Buffer {
    /// Creates a buffer holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
            live: Vec::new(),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The current text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consumes the buffer, returning its text.
    pub fn into_string(self) -> String {
        self.text
    }

    /// The character starting at `at`, if any.
    pub fn char_at(&self, at: impl Position) -> Option<char> {
        self.text.get(at.offset(self)..)?.chars().next()
    }

    /// The character ending right before `at`, if any.
    pub fn char_before(&self, at: impl Position) -> Option<char> {
        self.text.get(..at.offset(self))?.chars().next_back()
    }

    /// Returns true if `pattern` occurs at `at`.
    pub fn starts_with_at(&self, at: impl Position, pattern: &str) -> bool {
        self.text
            .get(at.offset(self)..)
            .is_some_and(|rest| rest.starts_with(pattern))
    }

    /// The text between two positions.
    ///
    /// Positions are clamped to the buffer and swapped when reversed. A range
    /// that does not fall on character boundaries yields an empty string.
    pub fn substring(&self, begin: impl Position, end: impl Position) -> &str {
        let (begin, end) = self.clamp(begin.offset(self), end.offset(self));
        self.text.get(begin..end).unwrap_or_default()
    }

    /// The `len` bytes starting at `begin`.
    pub fn substr(&self, begin: impl Position, len: usize) -> &str {
        let begin = begin.offset(self);
        self.substring(begin, begin.saturating_add(len))
    }

    /// Replaces the text between `begin` and `end` with `replacement`.
    ///
    /// Every live mark at or after `end` moves by the change in length.
    ///
    /// # Panics
    ///
    /// Panics if either position is not on a character boundary.
    pub fn replace_range(&mut self, begin: impl Position, end: impl Position, replacement: &str) {
        let (begin, end) = self.clamp(begin.offset(self), end.offset(self));
        self.text.replace_range(begin..end, replacement);

        let removed = end - begin;
        for (pos, _) in &mut self.live {
            if *pos >= end {
                *pos = *pos - removed + replacement.len();
            }
        }
    }

    /// Registers a new mark at `at`.
    pub fn mark(&mut self, at: impl Position) -> Mark {
        let offset = at.offset(self);
        let slot = self.marks.len();
        self.marks.push(Slot::Live(self.live.len()));
        self.live.push((offset, slot));
        Mark(slot)
    }

    /// The current offset of a mark, or `None` once it has been invalidated.
    pub fn position(&self, mark: Mark) -> Option<usize> {
        match self.marks.get(mark.0)? {
            Slot::Live(index) => self.live.get(*index).map(|(pos, _)| *pos),
            Slot::Released(pos) => Some(*pos),
            Slot::Invalid => None,
        }
    }

    /// Moves a live mark to `at`.
    pub fn set_position(&mut self, mark: Mark, at: impl Position) {
        let offset = at.offset(self);
        if let Some(pos) = self.live_position_mut(mark) {
            *pos = offset;
        }
    }

    /// Moves a live mark forward by `by` bytes.
    pub fn advance(&mut self, mark: Mark, by: usize) {
        if let Some(pos) = self.live_position_mut(mark) {
            *pos += by;
        }
    }

    /// Stops rebasing one mark. It keeps reporting its last position.
    pub fn release(&mut self, mark: Mark) {
        let Some(&Slot::Live(index)) = self.marks.get(mark.0) else {
            return;
        };
        let (pos, _) = self.live.swap_remove(index);
        self.marks[mark.0] = Slot::Released(pos);
        // the last live mark now sits at `index`
        if let Some(&(_, moved)) = self.live.get(index) {
            self.marks[moved] = Slot::Live(index);
        }
    }

    /// Stops rebasing every mark. Each keeps reporting its last position.
    pub fn release_marks(&mut self) {
        for (pos, slot) in self.live.drain(..) {
            self.marks[slot] = Slot::Released(pos);
        }
    }

    /// Invalidates every mark. Invalidated marks report no position.
    pub fn invalidate_marks(&mut self) {
        self.live.clear();
        for slot in &mut self.marks {
            *slot = Slot::Invalid;
        }
    }

    /// Number of marks still being rebased.
    pub fn live_marks(&self) -> usize {
        self.live.len()
    }

    fn live_position_mut(&mut self, mark: Mark) -> Option<&mut usize> {
        match self.marks.get(mark.0)? {
            Slot::Live(index) => self.live.get_mut(*index).map(|(pos, _)| pos),
            _ => None,
        }
    }

    fn clamp(&self, begin: usize, end: usize) -> (usize, usize) {
        let (begin, end) = if begin > end { (end, begin) } else { (begin, end) };
        (begin.min(self.len()), end.min(self.len()))
    }
}

impl std::fmt::Display for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
