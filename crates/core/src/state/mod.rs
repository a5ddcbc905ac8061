pub mod ids;
pub mod learning_state;
pub mod reducers;
pub mod types;

pub use ids::{AgentId, Intent};
pub use learning_state::{LearningState, StateUpdate};
pub use reducers::{ReducerKind, StateField};
pub use types::{
    AnalogyContent, AuditEntry, CompetencyAssessment, ConceptPrerequisites, Diagram, DiagramEdge,
    DiagramLabel, DiagramNode, DiagramPosition, ExternalResource, FeedbackGuidance, Flashcard,
    LearnerProfile, LearningStyle, Message, Mnemonic, Pace, ParetoDigest, PersonalizedPath,
    QuizKind, QuizQuestion, ResourceKind, RetrievedKnowledge, SourceKind, SourceMetadata,
};
