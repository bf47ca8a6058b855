use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parameters of one API action, tied to the action name and the response it yields.
pub trait Payload: Serialize {
    const NAME: &'static str;
    type Output: DeserializeOwned + Clone;
}
