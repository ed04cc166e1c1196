/// 每页条数的可选值
pub const PAGE_SIZES: [usize; 4] = [5, 10, 25, 50];
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// 取出第 `page` 页（从 0 开始）；越界时返回空切片
pub fn paginate<T>(items: &[T], page: usize, size: usize) -> &[T] {
    if size == 0 {
        return &[];
    }
    let start = page.saturating_mul(size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

pub fn page_count(total: usize, size: usize) -> usize {
    if size == 0 {
        0
    } else {
        total.div_ceil(size)
    }
}

/// 分页状态。过滤条件、页大小或标签页变化时必须回到第 0 页
#[derive(Debug, Clone, PartialEq)]
pub struct Pager {
    page: usize,
    size: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pager {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 只接受 PAGE_SIZES 中的值
    pub fn set_size(&mut self, size: usize) -> bool {
        if !PAGE_SIZES.contains(&size) {
            return false;
        }
        self.size = size;
        self.page = 0;
        true
    }

    /// 切换到下一个页大小（循环）
    pub fn cycle_size(&mut self) {
        let idx = PAGE_SIZES.iter().position(|s| *s == self.size).unwrap_or(0);
        let next = PAGE_SIZES[(idx + 1) % PAGE_SIZES.len()];
        self.set_size(next);
    }

    pub fn reset(&mut self) {
        self.page = 0;
    }

    /// 跳页，限制在有效范围内
    pub fn go_to(&mut self, page: usize, total: usize) {
        let last = page_count(total, self.size).saturating_sub(1);
        self.page = page.min(last);
    }

    pub fn next(&mut self, total: usize) {
        self.go_to(self.page + 1, total);
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        paginate(items, self.page, self.size)
    }

    /// "第 x/y 页" 的显示文本
    pub fn label(&self, total: usize) -> String {
        let pages = page_count(total, self.size).max(1);
        format!("第 {}/{} 页 · 每页 {} 条", self.page + 1, pages, self.size)
    }
}
