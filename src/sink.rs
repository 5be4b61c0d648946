use std::time::Duration;

use indicatif::ProgressBar;
use log::{debug, info, trace, warn};
use thiserror::Error;
use zeromq::{PubSocket, Socket, SocketSend, ZmqError, ZmqMessage};

use crate::boids::Flock;
use crate::wire::encode_frame;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("could not bind publisher to {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: ZmqError,
    },

    #[error("could not publish frame: {0}")]
    Send(#[from] ZmqError),
}

/// Anything that can hand one finished tick to subscribers.
#[allow(async_fn_in_trait)]
pub trait FrameSink {
    async fn publish(&mut self, frame: String) -> Result<(), SinkError>;
}

/// ZeroMQ PUB socket. Frames sent while nobody is subscribed are dropped.
pub struct ZmqPublisher {
    socket: PubSocket,
}

impl ZmqPublisher {
    pub async fn bind(endpoint: &str) -> Result<Self, SinkError> {
        let mut socket = PubSocket::new();
        let bound = socket
            .bind(endpoint)
            .await
            .map_err(|source| SinkError::Bind {
                endpoint: endpoint.to_string(),
                source,
            })?;
        info!("publishing ticks on {bound}");
        Ok(ZmqPublisher { socket })
    }
}

impl FrameSink for ZmqPublisher {
    async fn publish(&mut self, frame: String) -> Result<(), SinkError> {
        self.socket.send(ZmqMessage::from(frame)).await?;
        Ok(())
    }
}

/// Keeps every published frame in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub frames: Vec<String>,
}

impl FrameSink for RecordingSink {
    async fn publish(&mut self, frame: String) -> Result<(), SinkError> {
        self.frames.push(frame);
        Ok(())
    }
}

/// Steps the flock, publishes the finished tick and sleeps, until `max_ticks`
/// is reached or forever when it is `None`. Returns the number of ticks run.
pub async fn run<S: FrameSink>(
    flock: &mut Flock,
    sink: &mut S,
    tick_delay: Duration,
    max_ticks: Option<u64>,
    progress: &ProgressBar,
) -> u64 {
    let mut tick: u64 = 0;
    while max_ticks.is_none_or(|limit| tick < limit) {
        flock.step();
        let frame = encode_frame(flock.boids());
        trace!("tick {tick}: {} bytes", frame.len());
        if let Err(e) = sink.publish(frame).await {
            warn!("dropping tick {tick}: {e}");
        }
        tick += 1;
        progress.inc(1);
        tokio::time::sleep(tick_delay).await;
    }
    debug!("stopped after {tick} ticks");
    progress.finish();
    tick
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parameters;
    use crate::boids::Boid;
    use crate::wire::decode_frame;

    /// Fails every other publish.
    #[derive(Default)]
    struct FlakySink {
        attempts: u64,
        delivered: Vec<String>,
    }

    impl FrameSink for FlakySink {
        async fn publish(&mut self, frame: String) -> Result<(), SinkError> {
            self.attempts += 1;
            if self.attempts % 2 == 1 {
                return Err(SinkError::Send(ZmqError::Network(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "peer went away",
                ))));
            }
            self.delivered.push(frame);
            Ok(())
        }
    }

    #[tokio::test]
    async fn publishes_one_frame_per_tick() {
        let mut flock = Flock::from_boids(
            vec![Boid::new(0.0, 0.0, 0.1, 0.0), Boid::new(5.0, 5.0, 0.0, -0.1)],
            Parameters::default(),
        );
        let mut sink = RecordingSink::default();
        let ticks = run(
            &mut flock,
            &mut sink,
            Duration::from_millis(1),
            Some(3),
            &ProgressBar::hidden(),
        )
        .await;
        assert_eq!(ticks, 3);
        assert_eq!(sink.frames.len(), 3);
        for frame in &sink.frames {
            assert_eq!(decode_frame(frame).unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn last_frame_matches_final_state() {
        let mut flock = Flock::from_boids(
            vec![Boid::new(1.0, 1.0, 0.05, 0.05)],
            Parameters::default(),
        );
        let mut sink = RecordingSink::default();
        run(
            &mut flock,
            &mut sink,
            Duration::from_millis(1),
            Some(2),
            &ProgressBar::hidden(),
        )
        .await;
        assert_eq!(sink.frames.last(), Some(&encode_frame(flock.boids())));
    }

    #[tokio::test]
    async fn failed_publish_does_not_stop_the_loop() {
        let mut flock = Flock::from_boids(
            vec![Boid::new(0.0, 0.0, 0.1, 0.0)],
            Parameters::default(),
        );
        let mut sink = FlakySink::default();
        let ticks = run(
            &mut flock,
            &mut sink,
            Duration::from_millis(1),
            Some(4),
            &ProgressBar::hidden(),
        )
        .await;
        assert_eq!(ticks, 4);
        assert_eq!(sink.attempts, 4);
        assert_eq!(sink.delivered.len(), 2);
    }

    #[tokio::test]
    async fn zero_ticks_publishes_nothing() {
        let mut flock = Flock::from_boids(vec![], Parameters::default());
        let mut sink = RecordingSink::default();
        let ticks = run(
            &mut flock,
            &mut sink,
            Duration::from_millis(1),
            Some(0),
            &ProgressBar::hidden(),
        )
        .await;
        assert_eq!(ticks, 0);
        assert!(sink.frames.is_empty());
    }
}
