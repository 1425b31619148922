use peershare_protocol::ChunkMessage;

/// Name and content type of the file being transferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Original file name, used for output naming.
    pub file_name: String,
    /// Advisory content type.
    pub file_type: String,
}

impl FileMeta {
    pub fn new(file_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
        }
    }

    /// Returns `true` if `msg` carries this name and type.
    pub fn matches(&self, msg: &ChunkMessage) -> bool {
        self.file_name == msg.file_name && self.file_type == msg.file_type
    }
}

/// One ordered fragment of a file, borrowing its payload from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 0-based position within the transfer.
    pub index: u32,
    /// Total chunk count for the transfer.
    pub total: u32,
    /// Raw chunk data.
    pub payload: &'a [u8],
}

impl Chunk<'_> {
    /// Builds the wire message for this chunk.
    pub fn to_message(&self, meta: &FileMeta) -> ChunkMessage {
        ChunkMessage {
            index: self.index,
            total: self.total,
            file_name: meta.file_name.clone(),
            file_type: meta.file_type.clone(),
            chunk: self.payload.to_vec(),
        }
    }
}
