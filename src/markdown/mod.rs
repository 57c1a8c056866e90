//! # Markdown Tokenizer
//!
//! Converts pulldown-cmark's event stream into the flat block sequence the
//! layout engine consumes.
//!
//! Inline formatting is tracked with nesting counters and flattened into a
//! single style per run: a link wins over everything, then strong, then
//! emphasis, then strikethrough. Nested lists are flattened into the text of
//! their parent item; blockquotes keep only their text.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::model::{flatten_runs, Block, InlineRun, ListItem};

/// Tokenize a Markdown string into blocks, in document order.
pub fn tokenize(markdown: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut tokenizer = Tokenizer::default();
    for event in Parser::new_ext(markdown, options) {
        tokenizer.process_event(event);
    }
    log::debug!("tokenized {} blocks", tokenizer.blocks.len());
    tokenizer.blocks
}

/// Active inline formatting. Counters so nested emphasis closes correctly.
#[derive(Debug, Default)]
struct Formatting {
    strong: u32,
    emphasis: u32,
    strikethrough: u32,
    link: Option<String>,
}

#[derive(Debug)]
struct ListContext {
    ordered: bool,
    start: u64,
    items: Vec<ListItem>,
    current_item: Option<Vec<InlineRun>>,
}

#[derive(Debug)]
struct ImageContext {
    src: String,
    alt: String,
}

#[derive(Debug, Default)]
struct Tokenizer {
    formatting: Formatting,
    /// Runs of the paragraph or heading being built.
    runs: Vec<InlineRun>,
    heading: Option<u8>,
    code: Option<(String, Option<String>)>,
    image: Option<ImageContext>,
    list_stack: Vec<ListContext>,
    quote_depth: usize,
    quote_text: String,
    blocks: Vec<Block>,
}

impl Tokenizer {
    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.handle_start_tag(tag),
            Event::End(tag_end) => self.handle_end_tag(tag_end),
            Event::Text(text) => self.handle_text(&text),
            Event::Code(code) => self.handle_inline_code(code.to_string()),
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.handle_inline_code(math.to_string())
            }
            Event::SoftBreak => self.push_soft_break(),
            Event::HardBreak => self.push_run_text("\n".to_string()),
            Event::Rule => self.emit(Block::HorizontalRule),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_run(InlineRun::text(marker));
            }
            Event::Html(_) | Event::InlineHtml(_) | Event::FootnoteReference(_) => {}
        }
    }

    fn handle_start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if !self.in_container() {
                    self.runs.clear();
                }
            }
            Tag::Heading { level, .. } => {
                self.heading = Some(level as u8);
                self.runs.clear();
            }
            Tag::BlockQuote(_) => {
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.code = Some((String::new(), language));
            }
            Tag::HtmlBlock => {
                if !self.in_container() {
                    self.emit(Block::Space);
                }
            }
            Tag::List(start) => {
                self.list_stack.push(ListContext {
                    ordered: start.is_some(),
                    start: start.unwrap_or(1),
                    items: Vec::new(),
                    current_item: None,
                });
            }
            Tag::Item => {
                if let Some(list_ctx) = self.list_stack.last_mut() {
                    list_ctx.current_item = Some(Vec::new());
                }
            }
            Tag::Emphasis => self.formatting.emphasis += 1,
            Tag::Strong => self.formatting.strong += 1,
            Tag::Strikethrough => self.formatting.strikethrough += 1,
            Tag::Link { dest_url, .. } => {
                self.formatting.link = Some(dest_url.to_string());
            }
            Tag::Image { dest_url, .. } => {
                self.image = Some(ImageContext {
                    src: dest_url.to_string(),
                    alt: String::new(),
                });
            }
            _ => {}
        }
    }

    fn handle_end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => self.finish_paragraph(),
            TagEnd::Heading(_) => self.finish_heading(),
            TagEnd::BlockQuote(_) => self.finish_blockquote(),
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(_) => self.finish_list(),
            TagEnd::Item => self.finish_list_item(),
            TagEnd::Emphasis => {
                self.formatting.emphasis = self.formatting.emphasis.saturating_sub(1)
            }
            TagEnd::Strong => self.formatting.strong = self.formatting.strong.saturating_sub(1),
            TagEnd::Strikethrough => {
                self.formatting.strikethrough = self.formatting.strikethrough.saturating_sub(1)
            }
            TagEnd::Link => self.formatting.link = None,
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    self.push_run(InlineRun::Image {
                        alt: image.alt,
                        src: image.src,
                    });
                }
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, text: &str) {
        if let Some((code, _)) = self.code.as_mut() {
            code.push_str(text);
            return;
        }
        if let Some(image) = self.image.as_mut() {
            image.alt.push_str(text);
            return;
        }
        if text.is_empty() {
            return;
        }
        self.push_run_text(text.to_string());
    }

    fn handle_inline_code(&mut self, code: String) {
        if let Some(image) = self.image.as_mut() {
            image.alt.push_str(&code);
            return;
        }
        match &self.formatting.link {
            Some(href) => {
                let href = href.clone();
                self.push_run(InlineRun::Link { value: code, href });
            }
            None => self.push_run(InlineRun::CodeSpan { value: code }),
        }
    }

    /// Push text styled with the active formatting.
    fn push_run_text(&mut self, value: String) {
        if let Some(image) = self.image.as_mut() {
            image.alt.push_str(&value);
            return;
        }
        let f = &self.formatting;
        let run = if let Some(href) = &f.link {
            InlineRun::Link {
                value,
                href: href.clone(),
            }
        } else if f.strong > 0 {
            InlineRun::Strong { value }
        } else if f.emphasis > 0 {
            InlineRun::Emphasis { value }
        } else if f.strikethrough > 0 {
            InlineRun::Strikethrough { value }
        } else {
            InlineRun::Text { value }
        };
        self.push_run(run);
    }

    /// A soft line break is a word separator. It joins the preceding text
    /// run so the layout engine never sees it as a whitespace-only run.
    fn push_soft_break(&mut self) {
        if self.image.is_none() {
            if let Some(
                InlineRun::Text { value }
                | InlineRun::Strong { value }
                | InlineRun::Emphasis { value }
                | InlineRun::Strikethrough { value },
            ) = self.target_runs().last_mut()
            {
                value.push(' ');
                return;
            }
        }
        self.push_run_text(" ".to_string());
    }

    /// Route a run to the open list item, or to the current block.
    fn push_run(&mut self, run: InlineRun) {
        self.target_runs().push(run);
    }

    fn target_runs(&mut self) -> &mut Vec<InlineRun> {
        match self
            .list_stack
            .last_mut()
            .and_then(|ctx| ctx.current_item.as_mut())
        {
            Some(item) => item,
            None => &mut self.runs,
        }
    }

    fn in_container(&self) -> bool {
        self.quote_depth > 0 || !self.list_stack.is_empty()
    }

    /// Add a block at top level. Blocks inside containers are dropped or
    /// flattened by the container itself.
    fn emit(&mut self, block: Block) {
        if self.in_container() {
            return;
        }
        self.blocks.push(block);
    }

    fn finish_paragraph(&mut self) {
        if !self.list_stack.is_empty() {
            // Separate consecutive paragraphs of a loose list item.
            if let Some(item) = self
                .list_stack
                .last_mut()
                .and_then(|ctx| ctx.current_item.as_mut())
            {
                item.push(InlineRun::text(" "));
            }
            return;
        }
        let runs = std::mem::take(&mut self.runs);
        if self.quote_depth > 0 {
            if !self.quote_text.is_empty() {
                self.quote_text.push('\n');
            }
            self.quote_text.push_str(&flatten_runs(&runs));
            return;
        }
        if runs.is_empty() {
            return;
        }
        let text = flatten_runs(&runs);
        self.blocks.push(Block::Paragraph { text, runs });
    }

    fn finish_heading(&mut self) {
        let runs = std::mem::take(&mut self.runs);
        let Some(depth) = self.heading.take() else {
            return;
        };
        if self.in_container() {
            let text = flatten_runs(&runs);
            if !text.is_empty() {
                if !self.quote_text.is_empty() {
                    self.quote_text.push('\n');
                }
                self.quote_text.push_str(&text);
            }
            return;
        }
        let text = flatten_runs(&runs);
        self.blocks.push(Block::Heading { depth, text, runs });
    }

    fn finish_blockquote(&mut self) {
        self.quote_depth = self.quote_depth.saturating_sub(1);
        if self.quote_depth > 0 || !self.list_stack.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.quote_text);
        self.blocks.push(Block::Blockquote { text });
    }

    fn finish_code_block(&mut self) {
        let Some((mut text, language)) = self.code.take() else {
            return;
        };
        if text.ends_with('\n') {
            text.pop();
        }
        if !self.list_stack.is_empty() {
            self.push_run(InlineRun::CodeSpan { value: text });
        } else if self.quote_depth > 0 {
            if !self.quote_text.is_empty() {
                self.quote_text.push('\n');
            }
            self.quote_text.push_str(&text);
        } else {
            self.blocks.push(Block::Code { text, language });
        }
    }

    fn finish_list_item(&mut self) {
        let Some(list_ctx) = self.list_stack.last_mut() else {
            return;
        };
        let Some(mut runs) = list_ctx.current_item.take() else {
            return;
        };
        // Trailing separators left by loose paragraphs.
        while matches!(runs.last(), Some(InlineRun::Text { value }) if value.trim().is_empty()) {
            runs.pop();
        }
        list_ctx.items.push(ListItem { runs });
    }

    fn finish_list(&mut self) {
        let Some(list_ctx) = self.list_stack.pop() else {
            return;
        };

        // Nested list: flatten into the parent's open item.
        if let Some(parent) = self
            .list_stack
            .last_mut()
            .and_then(|ctx| ctx.current_item.as_mut())
        {
            for item in list_ctx.items {
                parent.push(InlineRun::text(" "));
                parent.extend(item.runs);
            }
            return;
        }

        let block = Block::List {
            ordered: list_ctx.ordered,
            start: list_ctx.start,
            items: list_ctx.items,
        };
        if self.quote_depth > 0 {
            if let Block::List { items, .. } = &block {
                for item in items {
                    if !self.quote_text.is_empty() {
                        self.quote_text.push('\n');
                    }
                    self.quote_text.push_str(&item.text());
                }
            }
            return;
        }
        self.blocks.push(block);
    }
}
