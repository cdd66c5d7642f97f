use crate::model::Task;

/// Counts over the whole list, independent of any filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

pub fn stats(tasks: &[Task]) -> Stats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|t| t.is_completed()).count();
    Stats {
        total,
        completed,
        pending: total - completed,
    }
}
