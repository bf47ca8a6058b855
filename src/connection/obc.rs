use serde_json::Value;

use crate::error::CqError;
use crate::payload::Payload;
use crate::types::action::{
    CleanDataDir, Content, DeleteMsg, Endpoint, GetGroupMemberInfo, GetGroupMemberList,
    GetLoginInfo, OnebotAction, SendDiscussMsg, SendGroupMsg, SendMsg, SendPrivateMsg,
    SetGroupKick,
};

/// A connection to a OneBot implementation.
///
/// This is the seam a transport plugs into: it receives fully built actions
/// and returns whatever the service answered. How the action travels (HTTP,
/// WebSocket, retries, auth) is up to the implementation.
#[allow(async_fn_in_trait)]
pub trait OneBotConnection {
    /// Error type for the connection. Encoding failures from
    /// [`OnebotAction::json`] convert into it.
    type Error: From<CqError>;

    /// Send an action to the OneBot implementation.
    async fn send<A>(&self, action: OnebotAction<A>) -> Result<A::Output, Self::Error>
    where
        A: Payload + 'static;
}

/// Convenience calls over any [`OneBotConnection`].
#[allow(async_fn_in_trait)]
pub trait MessageSender: OneBotConnection {
    async fn call<A>(&self, params: A) -> Result<A::Output, Self::Error>
    where
        A: Payload + 'static,
    {
        log::debug!("calling {}", A::NAME);
        self.send(OnebotAction::new(params)).await
    }

    /// Sends to a user. A string is sent as literal text.
    async fn send_private_message(
        &self,
        user_id: i64,
        content: impl Into<Content>,
    ) -> Result<Value, Self::Error> {
        self.call(SendPrivateMsg {
            user_id,
            content: content.into(),
        })
        .await
    }

    async fn send_group_message(
        &self,
        group_id: i64,
        content: impl Into<Content>,
    ) -> Result<Value, Self::Error> {
        self.call(SendGroupMsg {
            group_id,
            content: content.into(),
        })
        .await
    }

    async fn send_discuss_message(
        &self,
        discuss_id: i64,
        content: impl Into<Content>,
    ) -> Result<Value, Self::Error> {
        self.call(SendDiscussMsg {
            discuss_id,
            content: content.into(),
        })
        .await
    }

    /// Sends to wherever `endpoint` points, e.g. the origin of a received message.
    async fn send_message(
        &self,
        endpoint: Endpoint,
        content: impl Into<Content>,
    ) -> Result<Value, Self::Error> {
        self.call(SendMsg {
            endpoint,
            content: content.into(),
        })
        .await
    }

    async fn recall_message(&self, message_id: i64) -> Result<Value, Self::Error> {
        self.call(DeleteMsg { message_id }).await
    }

    async fn kick_group_member(&self, group_id: i64, user_id: i64) -> Result<Value, Self::Error> {
        self.call(SetGroupKick {
            group_id,
            user_id,
            reject_add_request: None,
        })
        .await
    }

    async fn login_info(&self) -> Result<Value, Self::Error> {
        self.call(GetLoginInfo {}).await
    }

    /// Always bypasses the service's member cache.
    async fn group_member_info(&self, group_id: i64, user_id: i64) -> Result<Value, Self::Error> {
        self.call(GetGroupMemberInfo {
            group_id,
            user_id,
            no_cache: true,
        })
        .await
    }

    async fn group_member_list(&self, group_id: i64) -> Result<Value, Self::Error> {
        self.call(GetGroupMemberList { group_id }).await
    }

    /// Clears cached images from the service's data directory.
    async fn clean_image_data(&self) -> Result<Value, Self::Error> {
        self.call(CleanDataDir {
            data_dir: "image".to_string(),
        })
        .await
    }
}

impl<C: OneBotConnection + ?Sized> MessageSender for C {}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::types::message::Message;

    /// Records every action it is handed and answers with a fixed message id.
    #[derive(Default)]
    struct RecordingConn {
        sent: Mutex<Vec<Value>>,
    }

    impl RecordingConn {
        fn sent(&self) -> Vec<Value> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl OneBotConnection for RecordingConn {
        type Error = CqError;

        async fn send<A>(&self, action: OnebotAction<A>) -> Result<A::Output, CqError>
        where
            A: Payload + 'static,
        {
            let payload: Value = serde_json::from_str(&action.json()?)?;
            self.sent.lock().unwrap().push(payload);
            Ok(serde_json::from_value(json!({"message_id": 1}))?)
        }
    }

    #[tokio::test]
    async fn sends_text_and_messages() {
        let conn = RecordingConn::default();
        let reply = conn.send_private_message(10001, "a&b").await.unwrap();
        assert_eq!(reply, json!({"message_id": 1}));

        let message = Message::from_text("hi ").combine(&Message::at(3)).unwrap();
        conn.send_group_message(42, message).await.unwrap();

        let sent = conn.sent();
        assert_eq!(
            sent[0],
            json!({
                "action": "send_private_msg",
                "params": {"user_id": 10001, "message": "a&b", "auto_escape": true}
            })
        );
        assert_eq!(sent[1]["action"], "send_group_msg");
        assert_eq!(sent[1]["params"]["message"].as_array().unwrap().len(), 2);
        assert_eq!(sent[1]["params"]["message"][1], json!({"type": "at", "data": {"qq": "3"}}));
    }

    #[tokio::test]
    async fn replies_to_endpoint() {
        let conn = RecordingConn::default();
        conn.send_message(Endpoint::Group { group_id: 7 }, Message::shake())
            .await
            .unwrap();
        conn.send_discuss_message(8, Content::markup("[CQ:at,qq=all]"))
            .await
            .unwrap();

        let sent = conn.sent();
        assert_eq!(
            sent[0]["params"],
            json!({
                "message_type": "group",
                "group_id": 7,
                "message": [{"type": "shake", "data": {}}]
            })
        );
        assert_eq!(sent[1]["params"]["auto_escape"], false);
    }

    #[tokio::test]
    async fn management_calls() {
        let conn = RecordingConn::default();
        conn.recall_message(99).await.unwrap();
        conn.kick_group_member(1, 2).await.unwrap();
        conn.login_info().await.unwrap();
        conn.group_member_info(1, 2).await.unwrap();
        conn.group_member_list(1).await.unwrap();
        conn.clean_image_data().await.unwrap();

        let sent = conn.sent();
        let actions: Vec<&str> = sent.iter().map(|a| a["action"].as_str().unwrap()).collect();
        assert_eq!(
            actions,
            [
                "delete_msg",
                "set_group_kick",
                "get_login_info",
                "get_group_member_info",
                "get_group_member_list",
                "clean_data_dir",
            ]
        );
        assert_eq!(sent[0]["params"], json!({"message_id": 99}));
        assert_eq!(sent[3]["params"]["no_cache"], true);
        assert_eq!(sent[5]["params"], json!({"data_dir": "image"}));
    }
}
