//! Conversation controller
//!
//! Owns one session's state and message log and runs each turn to
//! completion: classify, transition, respond, and submit the lead when the
//! last contact slot is filled. A turn is committed only after submission
//! succeeds.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use lead_assistant_core::{
    ConversationState, Intent, Message, MessageLog, PropertyContext, Sender, Stage,
};
use lead_assistant_integrations::{InquiryReceipt, InquirySubmitter};

use crate::classifier::IntentClassifier;
use crate::response::ResponseGenerator;
use crate::transition::{apply_intent, build_inquiry};
use crate::AgentError;

/// Conversation event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// Intent chosen for a committed turn
    IntentClassified { intent: Option<Intent> },
    /// Stage changed
    StageChanged { from: Stage, to: Stage },
    /// Completed lead accepted by the inquiry endpoint
    LeadSubmitted { inquiry_id: Option<String> },
}

/// What one turn produced
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub intent: Option<Intent>,
    pub reply: Message,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inquiry: Option<InquiryReceipt>,
}

/// One visitor's conversation
pub struct Conversation {
    session_id: String,
    state: ConversationState,
    messages: MessageLog,
    classifier: IntentClassifier,
    generator: ResponseGenerator,
    submitter: Arc<dyn InquirySubmitter>,
    event_tx: broadcast::Sender<ConversationEvent>,
}

impl Conversation {
    pub fn new(session_id: impl Into<String>, submitter: Arc<dyn InquirySubmitter>) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            session_id: session_id.into(),
            state: ConversationState::new(),
            messages: MessageLog::new(),
            classifier: IntentClassifier::new(),
            generator: ResponseGenerator::default(),
            submitter,
            event_tx,
        }
    }

    pub fn with_generator(mut self, generator: ResponseGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.event_tx.subscribe()
    }

    /// Process one user message
    ///
    /// On a submission error nothing is recorded: state and log are exactly
    /// as before the call and the same message can be sent again.
    pub async fn handle_turn(
        &mut self,
        text: &str,
        property: Option<&PropertyContext>,
    ) -> Result<TurnOutcome, AgentError> {
        let intent = self.classifier.classify(text, &self.state);
        let transition = apply_intent(intent, text, &self.state, property)?;
        let reply_text = self
            .generator
            .respond_to_turn(intent, text, &transition, property);

        let inquiry = if transition.lead_completed {
            let request = build_inquiry(&transition.state, property)?;
            match self.submitter.submit(&request).await {
                Ok(receipt) => {
                    tracing::info!(
                        session_id = %self.session_id,
                        inquiry_id = ?receipt.inquiry_id,
                        property_id = ?request.property_id,
                        "Lead submitted"
                    );
                    Some(receipt)
                },
                Err(e) => {
                    tracing::error!(session_id = %self.session_id, error = %e, "Inquiry submission failed");
                    return Err(e.into());
                },
            }
        } else {
            None
        };

        let from = self.state.stage();
        let to = transition.state.stage();

        self.messages.push(Message::user(text));
        let reply = Message::bot(reply_text);
        self.messages.push(reply.clone());
        self.state = transition.state;

        let _ = self
            .event_tx
            .send(ConversationEvent::IntentClassified { intent });
        if from != to {
            tracing::info!(session_id = %self.session_id, %from, %to, "Stage changed");
            let _ = self.event_tx.send(ConversationEvent::StageChanged { from, to });
        }
        if let Some(receipt) = &inquiry {
            let _ = self.event_tx.send(ConversationEvent::LeadSubmitted {
                inquiry_id: receipt.inquiry_id.clone(),
            });
        }

        Ok(TurnOutcome {
            intent,
            reply,
            stage: to,
            inquiry,
        })
    }

    /// Append a message written by a human agent
    pub fn record_agent_message(&mut self, text: impl Into<String>, sender: Sender) -> Message {
        let message = Message::agent(text, sender);
        tracing::debug!(session_id = %self.session_id, "Agent message recorded");
        self.messages.push(message.clone());
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lead_assistant_core::{MessageKind, PropertyStatus};
    use lead_assistant_integrations::{IntegrationError, InquiryRequest};
    use parking_lot::Mutex;

    use crate::response::FixedVariety;

    #[derive(Default)]
    struct RecordingSubmitter {
        calls: Mutex<Vec<InquiryRequest>>,
    }

    #[async_trait]
    impl InquirySubmitter for RecordingSubmitter {
        async fn submit(&self, inquiry: &InquiryRequest) -> Result<InquiryReceipt, IntegrationError> {
            self.calls.lock().push(inquiry.clone());
            Ok(InquiryReceipt {
                success: true,
                inquiry_id: Some("INQ-TEST0001".to_string()),
            })
        }
    }

    struct FailingSubmitter;

    #[async_trait]
    impl InquirySubmitter for FailingSubmitter {
        async fn submit(&self, _inquiry: &InquiryRequest) -> Result<InquiryReceipt, IntegrationError> {
            Err(IntegrationError::Rejected("endpoint unavailable".to_string()))
        }
    }

    fn villa() -> PropertyContext {
        PropertyContext::new("p-1", "Sea View Villa", 1_200_000, "Dubai Marina")
    }

    fn conversation(submitter: Arc<dyn InquirySubmitter>) -> Conversation {
        Conversation::new("session-1", submitter)
            .with_generator(ResponseGenerator::default().with_variety(Arc::new(FixedVariety(0))))
    }

    #[tokio::test]
    async fn test_full_lead_capture() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let mut conv = conversation(submitter.clone());
        let property = villa();

        let out = conv.handle_turn("I want to buy", Some(&property)).await.unwrap();
        assert_eq!(out.intent, Some(Intent::BuyIntent));
        assert!(out.reply.text().contains("Sea View Villa"));
        assert!(out.reply.text().contains("name"));

        let out = conv.handle_turn("John", Some(&property)).await.unwrap();
        assert_eq!(out.intent, Some(Intent::NameProvided));
        assert!(out.reply.text().contains("phone"));

        let out = conv.handle_turn("+971501234567", Some(&property)).await.unwrap();
        assert_eq!(out.intent, Some(Intent::PhoneProvided));
        assert!(out.reply.text().contains("email"));

        let out = conv.handle_turn("john@example.com", Some(&property)).await.unwrap();
        assert_eq!(out.intent, Some(Intent::EmailProvided));
        assert!(out.reply.text().contains("Thank you, John"));
        assert_eq!(out.stage, Stage::InquirySubmitted);
        assert_eq!(
            out.inquiry.and_then(|r| r.inquiry_id).as_deref(),
            Some("INQ-TEST0001")
        );

        let calls = submitter.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].property_id.as_deref(), Some("p-1"));
        assert_eq!(calls[0].name, "John");
        assert_eq!(calls[0].email, "john@example.com");
        assert!(calls[0].message.contains("+971501234567"));

        assert_eq!(conv.messages().len(), 8);
        assert_eq!(conv.state().stage(), Stage::InquirySubmitted);
    }

    #[tokio::test]
    async fn test_email_resent_after_submission() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let mut conv = conversation(submitter.clone());
        let property = villa();

        for text in ["I want to buy", "I\u{2019}m Priya", "+971501234567", "priya@example.com"] {
            conv.handle_turn(text, Some(&property)).await.unwrap();
        }
        assert_eq!(conv.state().user_name(), Some("Priya"));

        let out = conv.handle_turn("priya@example.com", Some(&property)).await.unwrap();
        assert_eq!(out.intent, Some(Intent::EmailProvided));
        assert!(out.reply.text().starts_with("We already have your details, Priya."));
        assert!(out.inquiry.is_none());
        assert_eq!(submitter.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_price_question_keeps_stage() {
        let mut conv = conversation(Arc::new(RecordingSubmitter::default()));
        let property = villa().with_status(PropertyStatus::ForSale);

        let out = conv.handle_turn("What's the price?", Some(&property)).await.unwrap();
        assert_eq!(out.intent, Some(Intent::PriceInquiry));
        assert!(out.reply.text().contains("AED 1,200,000"));
        assert!(out.reply.text().contains("for sale"));
        assert_eq!(out.stage, Stage::Greeting);
        assert_eq!(conv.state().stage(), Stage::Greeting);
    }

    #[tokio::test]
    async fn test_submission_failure_is_not_committed() {
        let mut conv = conversation(Arc::new(FailingSubmitter));
        let property = villa();
        for text in ["I want to buy", "John", "+971501234567"] {
            conv.handle_turn(text, Some(&property)).await.unwrap();
        }
        let before_state = conv.state().clone();
        let before_len = conv.messages().len();

        let err = conv
            .handle_turn("john@example.com", Some(&property))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Submission(IntegrationError::Rejected(_))));
        assert_eq!(conv.state(), &before_state);
        assert_eq!(conv.state().stage(), Stage::CollectingInfo);
        assert_eq!(conv.messages().len(), before_len);
    }

    #[tokio::test]
    async fn test_unrecognized_input_falls_back() {
        let mut conv = conversation(Arc::new(RecordingSubmitter::default()));
        let out = conv.handle_turn("qwerty uiop", None).await.unwrap();
        assert_eq!(out.intent, None);
        assert_eq!(out.reply.text(), crate::FALLBACK_RESPONSES[0]);
        assert_eq!(out.stage, Stage::Greeting);
    }

    #[tokio::test]
    async fn test_events_follow_committed_turns() {
        let mut conv = conversation(Arc::new(RecordingSubmitter::default()));
        let mut events = conv.subscribe();

        conv.handle_turn("I want to sell my apartment", None).await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            ConversationEvent::IntentClassified {
                intent: Some(Intent::SellIntent)
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            ConversationEvent::StageChanged {
                from: Stage::Greeting,
                to: Stage::CollectingInfo
            }
        );
    }

    #[tokio::test]
    async fn test_agent_message_is_logged() {
        let mut conv = conversation(Arc::new(RecordingSubmitter::default()));
        conv.handle_turn("hi", None).await.unwrap();
        let message = conv.record_agent_message("Hi, I'm Sara from the listing team.", Sender::new("Sara"));
        assert_eq!(message.kind(), MessageKind::Agent);
        assert_eq!(conv.messages().len(), 3);
        assert_eq!(conv.messages().last().and_then(|m| m.sender()).map(|s| s.name.as_str()), Some("Sara"));
    }
}
