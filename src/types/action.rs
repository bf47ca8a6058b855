use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::payload::Payload;

use super::message::Message;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnebotAction<T> {
    pub action: String,
    pub params: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo: Option<String>,
}

impl<T: Payload> OnebotAction<T> {
    pub fn json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self)?)
    }
    pub fn new(params: T) -> Self {
        Self {
            action: T::NAME.to_string(),
            params,
            echo: None,
        }
    }
    pub fn with_echo(params: T, echo: String) -> Self {
        Self {
            action: T::NAME.to_string(),
            params,
            echo: Some(echo),
        }
    }
}

/// Where a `send_msg` goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum Endpoint {
    Private { user_id: i64 },
    Group { group_id: i64 },
    Discuss { discuss_id: i64 },
}

/// The `message` of a send action.
///
/// A plain string is sent with `auto_escape`: when set the service treats it as
/// literal text, otherwise as pre-formatted CQ markup. A [`Message`] is sent
/// as its segment array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Plain { message: String, auto_escape: bool },
    Segments { message: Message },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Plain {
            message: text.into(),
            auto_escape: true,
        }
    }

    pub fn markup(markup: impl Into<String>) -> Self {
        Content::Plain {
            message: markup.into(),
            auto_escape: false,
        }
    }
}

impl From<Message> for Content {
    fn from(message: Message) -> Self {
        Content::Segments { message }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::text(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::text(text)
    }
}

macro_rules! impl_payload {
    (
        @[name=$name:ident]
        $(
            #[ $($method_meta:tt)* ]
        )*
        $vi:vis $Action:ident  => $Ret:ty {
            $(
                required {
                    $(
                        $(
                            #[ $($field_meta:tt)* ]
                        )*
                        $v:vis $fields:ident : $FTy:ty
                        ,
                    )*
                }
            )?

            $(
                optional {
                    $(
                        $(
                            #[ $($opt_field_meta:tt)* ]
                        )*
                        $opt_v:vis $opt_fields:ident : $OptFTy:ty
                    ),*
                    $(,)?
                }
            )?
        }
    ) => {
        $(
            #[ $($method_meta)* ]
        )*
        $vi struct $Action {
            $(
                $(
                    $(
                        #[ $($field_meta)* ]
                    )*
                    $v $fields : $FTy,
                )*
            )?
            $(
                $(
                    $(
                        #[ $($opt_field_meta)* ]
                    )*
                    #[serde(skip_serializing_if = "Option::is_none")]
                    $opt_v $opt_fields : core::option::Option<$OptFTy>,
                )*
            )?
        }

        impl $crate::payload::Payload for $Action {
            const NAME: &'static str = stringify!($name);
            type Output = $Ret;
        }
    };
}

impl_payload!(
    @[name=send_private_msg]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub SendPrivateMsg => Value {
        required {
            pub user_id: i64,
            #[serde(flatten)]
            pub content: Content,
        }
    }
);
impl_payload!(
    @[name=send_group_msg]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub SendGroupMsg => Value {
        required {
            pub group_id: i64,
            #[serde(flatten)]
            pub content: Content,
        }
    }
);
impl_payload!(
    @[name=send_discuss_msg]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub SendDiscussMsg => Value {
        required {
            pub discuss_id: i64,
            #[serde(flatten)]
            pub content: Content,
        }
    }
);
impl_payload!(
    @[name=send_msg]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub SendMsg => Value {
        required {
            #[serde(flatten)]
            pub endpoint: Endpoint,
            #[serde(flatten)]
            pub content: Content,
        }
    }
);
impl_payload!(
    @[name=delete_msg]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub DeleteMsg => Value {
        required {
            pub message_id: i64,
        }
    }
);
impl_payload!(
    @[name=set_group_kick]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub SetGroupKick => Value {
        required {
            pub group_id: i64,
            pub user_id: i64,
        }
        optional {
            pub reject_add_request: bool,
        }
    }
);
impl_payload!(
    @[name=get_login_info]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub GetLoginInfo => Value {}
);
impl_payload!(
    @[name=get_group_member_info]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub GetGroupMemberInfo => Value {
        required {
            pub group_id: i64,
            pub user_id: i64,
            pub no_cache: bool,
        }
    }
);
impl_payload!(
    @[name=get_group_member_list]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub GetGroupMemberList => Value {
        required {
            pub group_id: i64,
        }
    }
);
impl_payload!(
    @[name=clean_data_dir]
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub CleanDataDir => Value {
        required {
            pub data_dir: String,
        }
    }
);
