use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
  #[error("graph is not indexable: {0}")]
  Graph(#[from] gaff_graph::GraphError),

  #[error("scheduler made no progress; {remaining} node(s) never became ready — the graph likely contains a cycle that validation missed")]
  NoProgress { remaining: usize },
}
