//! 入站消息分类
//!
//! 纯函数：决定一条入站消息应该产生什么事件、发给谁，不需要任何锁。

use crate::entities::{Attachment, Identity, InboundPayload};

/// 投递范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// 发给除发送者以外的所有会话
    Broadcast,
    /// 只发给当前持有该身份的会话
    Direct(Identity),
}

impl Delivery {
    fn from_target(target: Option<Identity>) -> Self {
        match target {
            Some(identity) => Self::Direct(identity),
            None => Self::Broadcast,
        }
    }
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// 文本和附件都为空，向其他会话发送 `Empty`
    Empty,
    Chat { text: String, delivery: Delivery },
    /// 先上传附件，再发送 `Image`
    Image {
        attachment: Attachment,
        delivery: Delivery,
    },
}

/// 按顺序应用路由规则
///
/// 同时带有文本和附件时附件优先，文本被忽略。
pub fn classify(payload: InboundPayload) -> Dispatch {
    if payload.is_empty() {
        return Dispatch::Empty;
    }

    let delivery = Delivery::from_target(payload.target());
    match payload.image {
        Some(attachment) => Dispatch::Image {
            attachment,
            delivery,
        },
        None => Dispatch::Chat {
            text: payload.message,
            delivery,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> Attachment {
        Attachment::new(vec![1, 2, 3], "image/png")
    }

    #[test]
    fn empty_payload() {
        assert_eq!(classify(InboundPayload::default()), Dispatch::Empty);
        // 只有接收者没有内容仍然是空消息
        assert_eq!(
            classify(InboundPayload::default().with_target("bob")),
            Dispatch::Empty
        );
    }

    #[test]
    fn image_with_target() {
        let dispatch = classify(InboundPayload::default().with_target("bob1").with_image(png()));
        assert_eq!(
            dispatch,
            Dispatch::Image {
                attachment: png(),
                delivery: Delivery::Direct(Identity::from("bob1")),
            }
        );
    }

    #[test]
    fn image_without_target() {
        let dispatch = classify(InboundPayload::default().with_image(png()));
        assert!(matches!(
            dispatch,
            Dispatch::Image {
                delivery: Delivery::Broadcast,
                ..
            }
        ));
    }

    #[test]
    fn chat_with_and_without_target() {
        assert_eq!(
            classify(InboundPayload::text("hi").with_target("bob1")),
            Dispatch::Chat {
                text: "hi".into(),
                delivery: Delivery::Direct(Identity::from("bob1")),
            }
        );
        assert_eq!(
            classify(InboundPayload::text("hi")),
            Dispatch::Chat {
                text: "hi".into(),
                delivery: Delivery::Broadcast,
            }
        );
    }

    #[test]
    fn attachment_wins_over_text() {
        let dispatch = classify(InboundPayload::text("caption").with_image(png()));
        assert!(matches!(dispatch, Dispatch::Image { .. }));
    }
}
