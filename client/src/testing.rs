//! Scripted link and response builders for unit tests.

use crate::error::{Result, TraciError};
use crate::link::Link;
use parking_lot::Mutex;
use std::collections::VecDeque;
use wire::constants::{CMD_SIMSTEP, RESPONSE_OFFSET};
use wire::{
    Command, RequestMessage, ResponseContainer, ResponseMessage, StatusResponse, Value,
    WireWriter,
};

/// Answers each round trip with the next queued reply and records requests
#[derive(Default)]
pub struct ScriptedLink {
    replies: Mutex<VecDeque<Vec<ResponseContainer>>>,
    requests: Mutex<Vec<RequestMessage>>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, containers: Vec<ResponseContainer>) {
        self.replies.lock().push_back(containers);
    }

    pub fn requests(&self) -> Vec<RequestMessage> {
        self.requests.lock().clone()
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.lock().len()
    }
}

impl Link for ScriptedLink {
    fn transact(&self, request: &[u8]) -> Result<Vec<u8>> {
        self.requests.lock().push(RequestMessage::decode(request)?);
        let containers = self.replies.lock().pop_front().ok_or_else(|| {
            TraciError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "no scripted reply left",
            ))
        })?;
        Ok(ResponseMessage::new(containers).encode()?)
    }
}

pub fn ok(command: u8) -> ResponseContainer {
    ResponseContainer::status_only(StatusResponse::ok(command))
}

pub fn step_reply() -> ResponseContainer {
    ResponseContainer::with_sub_responses(StatusResponse::ok(CMD_SIMSTEP), Vec::new())
}

pub fn value_reply(command: u8, variable: u8, object: &str, value: Value) -> ResponseContainer {
    let mut payload = WireWriter::new();
    payload.write_u8(variable);
    payload.write_string(object).unwrap();
    value.write(&mut payload).unwrap();
    ResponseContainer::with_response(
        StatusResponse::ok(command),
        Command::new(command + RESPONSE_OFFSET, payload.into_bytes()),
    )
}

pub fn id_list_reply(command: u8, variable: u8, ids: &[&str]) -> ResponseContainer {
    value_reply(
        command,
        variable,
        "",
        Value::StringList(ids.iter().map(|id| id.to_string()).collect()),
    )
}
