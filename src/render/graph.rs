//! Per-frame GPU task scheduling with declared dependencies

use std::collections::VecDeque;

use crate::core::error::Error;
use crate::core::types::Result;

/// Handle to a task added to a [`TaskGraph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskId(usize);

struct Task<'a> {
    label: &'static str,
    deps: Vec<TaskId>,
    run: Box<dyn FnOnce(&mut wgpu::CommandEncoder) + 'a>,
}

/// Single-frame graph of GPU passes. Each task records into the shared
/// command encoder; the scheduler orders tasks so every declared
/// dependency is encoded first, which is what guarantees in-order
/// execution on the queue.
pub struct TaskGraph<'a> {
    tasks: Vec<Task<'a>>,
}

impl<'a> TaskGraph<'a> {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a task that must run after every task in `deps`
    pub fn add(
        &mut self,
        label: &'static str,
        deps: &[TaskId],
        run: impl FnOnce(&mut wgpu::CommandEncoder) + 'a,
    ) -> TaskId {
        let id = TaskId(self.tasks.len());
        self.tasks.push(Task {
            label,
            deps: deps.to_vec(),
            run: Box::new(run),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Encode all tasks in dependency order (Kahn's algorithm, insertion
    /// order among ready tasks so scheduling stays deterministic).
    pub fn execute(self, encoder: &mut wgpu::CommandEncoder) -> Result<()> {
        let count = self.tasks.len();

        let mut indegree = vec![0usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (index, task) in self.tasks.iter().enumerate() {
            for dep in &task.deps {
                if dep.0 >= count {
                    return Err(Error::Schedule(format!(
                        "task '{}' depends on unknown task {}",
                        task.label, dep.0
                    )));
                }
                indegree[index] += 1;
                dependents[dep.0].push(index);
            }
        }

        let mut ready: VecDeque<usize> = (0..count).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(count);
        while let Some(index) = ready.pop_front() {
            order.push(index);
            for &next in &dependents[index] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push_back(next);
                }
            }
        }

        if order.len() != count {
            return Err(Error::Schedule("task graph contains a cycle".into()));
        }

        let mut runs: Vec<Option<Box<dyn FnOnce(&mut wgpu::CommandEncoder) + 'a>>> =
            self.tasks.into_iter().map(|task| Some(task.run)).collect();
        for index in order {
            if let Some(run) = runs[index].take() {
                run(encoder);
            }
        }
        Ok(())
    }
}

impl Default for TaskGraph<'_> {
    fn default() -> Self {
        Self::new()
    }
}
