//! 边界断点
//!
//! 边界把一个已经设置好的断点标记为上下文切换的信号，避免重新插入断点导致的行号偏移。

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Border {
    pub file: String,
    pub line: u32,
}

impl Border {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// 边界集合，允许重复
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorderSet {
    borders: Vec<Border>,
}

impl BorderSet {
    pub fn push(&mut self, border: Border) {
        self.borders.push(border);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Border> {
        self.borders.iter()
    }

    pub fn len(&self) -> usize {
        self.borders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.borders.is_empty()
    }
}
