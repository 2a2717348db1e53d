use super::solvers::SimplexObserver;
use crate::vector::Point;
use crossbeam::channel::{self, Receiver, Sender};

/// Keeps a copy of every simplex delivered to it, grouped by iteration
#[derive(Debug, Default, Clone)]
pub struct SimplexRecorder {
    history: Vec<Vec<Point>>,
}

impl SimplexRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get iteration history
    pub fn history(&self) -> &[Vec<Point>] {
        &self.history
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Total number of vertex notifications received
    pub fn vertex_count(&self) -> usize {
        self.history.iter().map(Vec::len).sum()
    }

    /// Simplex of the last observed iteration, best vertex first
    pub fn last(&self) -> Option<&[Point]> {
        self.history.last().map(Vec::as_slice)
    }
}

impl SimplexObserver for SimplexRecorder {
    fn on_iteration(&mut self, _iteration: u32) {
        self.history.push(Vec::new());
    }

    fn on_vertex(&mut self, point: &[f64]) {
        if self.history.is_empty() {
            self.history.push(Vec::new());
        }
        if let Some(current) = self.history.last_mut() {
            current.push(point.to_vec());
        }
    }
}

/// Event published by a [`ChannelObserver`]
#[derive(Debug, Clone, PartialEq)]
pub enum SimplexEvent {
    Iteration(u32),
    Vertex(Point),
}

/// Publishes simplex snapshots into a bounded channel.
///
/// Sending blocks while the channel is full, so the solver still waits on a slow
/// consumer. Once the receiver is gone further events are discarded.
pub struct ChannelObserver {
    sender: Sender<SimplexEvent>,
    disconnected: bool,
}

impl ChannelObserver {
    pub fn bounded(capacity: usize) -> (Self, Receiver<SimplexEvent>) {
        let (sender, receiver) = channel::bounded(capacity);
        (
            Self {
                sender,
                disconnected: false,
            },
            receiver,
        )
    }

    fn publish(&mut self, event: SimplexEvent) {
        if self.disconnected {
            return;
        }
        if self.sender.send(event).is_err() {
            log::debug!("Simplex receiver dropped, discarding further snapshots");
            self.disconnected = true;
        }
    }
}

impl SimplexObserver for ChannelObserver {
    fn on_iteration(&mut self, iteration: u32) {
        self.publish(SimplexEvent::Iteration(iteration));
    }

    fn on_vertex(&mut self, point: &[f64]) {
        self.publish(SimplexEvent::Vertex(point.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_groups_vertices_by_iteration() {
        let mut recorder = SimplexRecorder::new();
        recorder.on_iteration(1);
        recorder.on_vertex(&[0.0]);
        recorder.on_vertex(&[1.0]);
        recorder.on_iteration(2);
        recorder.on_vertex(&[0.5]);
        recorder.on_vertex(&[0.0]);

        assert_eq!(recorder.iterations(), 2);
        assert_eq!(recorder.vertex_count(), 4);
        assert_eq!(recorder.last().unwrap(), &[vec![0.5], vec![0.0]]);
    }

    #[test]
    fn recorder_without_iteration_marker() {
        let mut recorder = SimplexRecorder::new();
        recorder.on_vertex(&[3.0]);
        assert_eq!(recorder.history(), &[vec![vec![3.0]]]);
    }

    #[test]
    fn channel_observer_forwards_events_in_order() {
        let (mut observer, receiver) = ChannelObserver::bounded(4);
        observer.on_iteration(1);
        observer.on_vertex(&[1.0, 2.0]);

        assert_eq!(receiver.recv().unwrap(), SimplexEvent::Iteration(1));
        assert_eq!(receiver.recv().unwrap(), SimplexEvent::Vertex(vec![1.0, 2.0]));
    }

    #[test]
    fn channel_observer_survives_dropped_receiver() {
        let (mut observer, receiver) = ChannelObserver::bounded(1);
        drop(receiver);
        observer.on_iteration(1);
        observer.on_vertex(&[0.0]);
        assert!(observer.disconnected);
    }
}
