//! Serializer output and the counts gathered while producing it.

/// Markdown produced for a document.
#[derive(Debug, Clone, Default)]
pub struct RenderResult {
    pub content: String,
    pub stats: RenderStats,
}

impl RenderResult {
    pub fn new(content: String, stats: RenderStats) -> Self {
        Self { content, stats }
    }
}

/// Kinds of Markdown constructs the serializer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitted {
    Heading,
    Paragraph,
    ListItem,
    Table,
    Image,
    CodeBlock,
    Link,
}

/// Number of constructs of each kind written to the output. Blocks skipped
/// as empty are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub heading_count: u32,
    pub paragraph_count: u32,
    pub list_item_count: u32,
    pub table_count: u32,
    pub image_count: u32,
    pub code_block_count: u32,
    pub link_count: u32,
}

impl RenderStats {
    pub fn record(&mut self, kind: Emitted) {
        let counter = match kind {
            Emitted::Heading => &mut self.heading_count,
            Emitted::Paragraph => &mut self.paragraph_count,
            Emitted::ListItem => &mut self.list_item_count,
            Emitted::Table => &mut self.table_count,
            Emitted::Image => &mut self.image_count,
            Emitted::CodeBlock => &mut self.code_block_count,
            Emitted::Link => &mut self.link_count,
        };
        *counter += 1;
    }

    /// All constructs written.
    pub fn total(&self) -> u32 {
        self.heading_count
            + self.paragraph_count
            + self.list_item_count
            + self.table_count
            + self.image_count
            + self.code_block_count
            + self.link_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_by_kind() {
        let mut stats = RenderStats::default();
        stats.record(Emitted::Table);
        stats.record(Emitted::Table);
        stats.record(Emitted::Link);
        assert_eq!(stats.table_count, 2);
        assert_eq!(stats.link_count, 1);
        assert_eq!(stats.total(), 3);
    }
}
