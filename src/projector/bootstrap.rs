use super::error::ProjectorError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartupQuery {
    Subscribe,
    ListSinks,
    ListSinkInputs,
}

impl StartupQuery {
    pub const ALL: [StartupQuery; 3] = [Self::Subscribe, Self::ListSinks, Self::ListSinkInputs];

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Default)]
pub struct Bootstrap {
    done: [bool; 3],
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `query` done. Returns true when this completes the startup set.
    pub fn complete(&mut self, query: StartupQuery) -> bool {
        let was_ready = self.is_ready();
        self.done[query.slot()] = true;
        !was_ready && self.is_ready()
    }

    pub fn is_done(&self, query: StartupQuery) -> bool {
        self.done[query.slot()]
    }

    pub fn completed(&self) -> usize {
        self.done.iter().filter(|d| **d).count()
    }

    pub fn is_ready(&self) -> bool {
        self.completed() == StartupQuery::ALL.len()
    }

    pub fn checkpoint(&self) -> Result<(), ProjectorError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ProjectorError::BootstrapIncomplete {
                completed: self.completed(),
                required: StartupQuery::ALL.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_after_all_three() {
        let mut bootstrap = Bootstrap::new();
        assert!(!bootstrap.complete(StartupQuery::ListSinks));
        assert!(!bootstrap.complete(StartupQuery::Subscribe));
        assert!(!bootstrap.is_ready());
        assert!(bootstrap.complete(StartupQuery::ListSinkInputs));
        assert!(bootstrap.is_ready());
        assert!(bootstrap.checkpoint().is_ok());
    }

    #[test]
    fn test_repeat_completion_is_not_counted_twice() {
        let mut bootstrap = Bootstrap::new();
        bootstrap.complete(StartupQuery::ListSinks);
        bootstrap.complete(StartupQuery::ListSinks);
        assert_eq!(bootstrap.completed(), 1);
    }

    #[test]
    fn test_checkpoint_incomplete_is_fatal() {
        let mut bootstrap = Bootstrap::new();
        bootstrap.complete(StartupQuery::Subscribe);
        let err = bootstrap.checkpoint().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, ProjectorError::BootstrapIncomplete { completed: 1, required: 3 }));
    }
}
