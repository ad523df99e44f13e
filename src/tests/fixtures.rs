use crate::identity::Identity;
use crate::types::enums::MessageKind;
use crate::types::id::MessageId;
use crate::types::message::Message;

pub fn identity(seed: u8) -> Identity {
    Identity::from_bytes(&[seed; 32])
}

pub fn signed(author: &Identity, id: &str, kind: MessageKind, target: Option<&str>, body: &str, ts: u64) -> Message {
    let mut msg = Message::draft(
        MessageId::from(id),
        author.address(),
        "nick",
        "topic",
        ts,
        kind,
        target.map(MessageId::from),
        body,
    );
    author.sign_message(&mut msg).unwrap();
    msg
}

pub fn reaction(author: &Identity, id: &str, target: &str, body: &str, ts: u64) -> Message {
    signed(author, id, MessageKind::Reaction, Some(target), body, ts)
}
