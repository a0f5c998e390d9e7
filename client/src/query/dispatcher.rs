use super::{Query, Responses};
use crate::error::{Result, TraciError};
use crate::link::Link;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use wire::{RequestMessage, ResponseMessage};

/// Packs queries into one physical message and hands the answers back
pub struct Dispatcher<L> {
    link: L,
    round_trips: AtomicU64,
}

impl<L: Link> Dispatcher<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            round_trips: AtomicU64::new(0),
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Number of physical round trips performed so far
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::Relaxed)
    }

    /// Runs `queries` as one batch, in the given order.
    ///
    /// Every status of the response is checked before any query consumes, so
    /// a simulator failure leaves all caches as they were. The simulator may
    /// still have applied commands that preceded the failing one.
    pub fn dispatch(&self, queries: &[&dyn Query]) -> Result<()> {
        let mut message = RequestMessage::new();
        let mut counts = Vec::with_capacity(queries.len());
        for query in queries {
            let commands = query.requests()?;
            counts.push(commands.len());
            message.extend(commands);
        }

        if message.is_empty() {
            return Ok(());
        }

        let request = message.encode()?;
        debug!(
            "dispatching {} queries as {} commands ({} bytes)",
            queries.len(),
            message.len(),
            request.len()
        );

        let reply = self.link.transact(&request)?;
        self.round_trips.fetch_add(1, Ordering::Relaxed);
        let response = ResponseMessage::decode(&reply)?;

        if response.len() != message.len() {
            return Err(TraciError::ResponseCount {
                expected: message.len(),
                actual: response.len(),
            });
        }

        for (command, container) in message.commands().iter().zip(response.containers()) {
            let status = container.status();
            if status.command() != command.id() {
                return Err(TraciError::UnexpectedCommand {
                    expected: command.id(),
                    actual: status.command(),
                });
            }
            if !status.is_ok() {
                return Err(TraciError::Simulator {
                    command: status.command(),
                    result: status.result(),
                    description: status.description().to_string(),
                });
            }
        }

        let mut responses = Responses::new(response.containers());
        for (query, expected) in queries.iter().zip(counts) {
            let start = responses.consumed();
            query.consume(&mut responses)?;
            let taken = responses.consumed() - start;
            if taken != expected {
                return Err(TraciError::Invariant(format!(
                    "query consumed {} responses for {} requests",
                    taken, expected
                )));
            }
        }

        Ok(())
    }
}

/// An explicit batch assembled by the caller
#[derive(Default)]
pub struct Batch<'q> {
    queries: Vec<&'q dyn Query>,
}

impl<'q> Batch<'q> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, query: &'q dyn Query) -> &mut Self {
        self.queries.push(query);
        self
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn run<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<()> {
        dispatcher.dispatch(&self.queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ChangeStateQuery, ReadQuery};
    use crate::testing::{ok, value_reply, ScriptedLink};
    use wire::constants::*;
    use wire::{ResponseContainer, StatusResponse, Value, ValueType};

    fn speed_query(id: &str) -> ReadQuery {
        ReadQuery::new(CMD_GET_VEHICLE_VARIABLE, id, VAR_SPEED, ValueType::Double)
    }

    fn speed_reply(id: &str, speed: f64) -> ResponseContainer {
        value_reply(CMD_GET_VEHICLE_VARIABLE, VAR_SPEED, id, Value::Double(speed))
    }

    #[test]
    fn test_empty_batch_does_no_io() {
        let dispatcher = Dispatcher::new(ScriptedLink::new());
        Batch::new().run(&dispatcher).unwrap();
        assert_eq!(dispatcher.round_trips(), 0);
    }

    #[test]
    fn test_batch_is_one_round_trip_in_order() {
        let link = ScriptedLink::new();
        link.push_reply(vec![
            speed_reply("a", 1.0),
            speed_reply("b", 2.0),
            speed_reply("c", 3.0),
        ]);
        let dispatcher = Dispatcher::new(link);

        let (a, b, c) = (speed_query("a"), speed_query("b"), speed_query("c"));
        let mut batch = Batch::new();
        batch.add(&a).add(&b).add(&c);
        batch.run(&dispatcher).unwrap();

        assert_eq!(dispatcher.round_trips(), 1);
        assert_eq!(a.cached(), Some(Value::Double(1.0)));
        assert_eq!(b.cached(), Some(Value::Double(2.0)));
        assert_eq!(c.cached(), Some(Value::Double(3.0)));

        let sent = dispatcher.link().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), 3);
    }

    #[test]
    fn test_permuted_batches_give_same_values() {
        let speeds = [("a", 1.5), ("b", -0.0), ("c", 42.0)];
        let orders = [[0, 1, 2], [2, 0, 1], [1, 2, 0]];

        for order in orders {
            let link = ScriptedLink::new();
            link.push_reply(
                order
                    .iter()
                    .map(|&i| speed_reply(speeds[i].0, speeds[i].1))
                    .collect(),
            );
            let dispatcher = Dispatcher::new(link);
            let queries: Vec<ReadQuery> = speeds.iter().map(|(id, _)| speed_query(id)).collect();

            let mut batch = Batch::new();
            for &i in &order {
                batch.add(&queries[i]);
            }
            batch.run(&dispatcher).unwrap();

            for (query, (_, speed)) in queries.iter().zip(speeds) {
                assert_eq!(query.cached(), Some(Value::Double(speed)));
            }
        }
    }

    #[test]
    fn test_failed_status_commits_nothing() {
        let link = ScriptedLink::new();
        link.push_reply(vec![
            speed_reply("a", 1.0),
            ResponseContainer::status_only(StatusResponse::error(
                CMD_GET_VEHICLE_VARIABLE,
                "Vehicle 'b' is not known",
            )),
        ]);
        let dispatcher = Dispatcher::new(link);
        let (a, b) = (speed_query("a"), speed_query("b"));

        let mut batch = Batch::new();
        batch.add(&a).add(&b);
        let err = batch.run(&dispatcher).unwrap_err();

        match err {
            TraciError::Simulator { description, .. } => {
                assert_eq!(description, "Vehicle 'b' is not known")
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(a.cached(), None);
        assert_eq!(b.cached(), None);
    }

    #[test]
    fn test_response_count_mismatch() {
        let link = ScriptedLink::new();
        link.push_reply(vec![speed_reply("a", 1.0)]);
        let dispatcher = Dispatcher::new(link);
        let (a, b) = (speed_query("a"), speed_query("b"));

        let err = dispatcher.dispatch(&[&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            TraciError::ResponseCount {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_echoed_command_must_match_request() {
        let link = ScriptedLink::new();
        link.push_reply(vec![ok(CMD_SET_VEHICLE_VARIABLE)]);
        let dispatcher = Dispatcher::new(link);

        let err = dispatcher.dispatch(&[&speed_query("a")]).unwrap_err();
        assert!(matches!(
            err,
            TraciError::UnexpectedCommand {
                expected: CMD_GET_VEHICLE_VARIABLE,
                actual: CMD_SET_VEHICLE_VARIABLE
            }
        ));
    }

    #[test]
    fn test_mixed_read_and_write_batch() {
        let link = ScriptedLink::new();
        link.push_reply(vec![ok(CMD_SET_VEHICLE_VARIABLE), speed_reply("a", 8.0)]);
        let dispatcher = Dispatcher::new(link);

        let write = ChangeStateQuery::new(CMD_SET_VEHICLE_VARIABLE, "a", VAR_MAXSPEED)
            .with_value(Value::Double(8.0));
        let read = speed_query("a");
        dispatcher.dispatch(&[&write, &read]).unwrap();
        assert_eq!(read.cached(), Some(Value::Double(8.0)));
    }
}
