//! crates/practice_coach_core/src/templates.rs
//!
//! Built-in seed configurations for new profiles.

use crate::domain::{
    DiaryProfile, DiaryResponse, InterviewProfile, PreQuestion, Profile, ProfileHeader,
    ProfileKind, SpeechProfile,
};

/// A pre-question as declared by a template: prompt text and whether the
/// user must answer it before starting.
pub type PreQuestionSeed = (&'static str, bool);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemplateBody {
    Interview {
        default_question_count: u32,
        pre_questions: &'static [PreQuestionSeed],
    },
    Speech {
        target_duration_secs: u32,
    },
    Diary {
        questions: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Template {
    pub key: &'static str,
    pub title: &'static str,
    pub prompt: &'static str,
    pub body: TemplateBody,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        key: "college_interview",
        title: "College Interview",
        prompt: "You are an admissions officer interviewing a prospective undergraduate. \
                 Ask about academic interests, extracurricular commitments and fit with the school.",
        body: TemplateBody::Interview {
            default_question_count: 5,
            pre_questions: &[
                ("Which college are you interviewing for?", true),
                ("What do you intend to study?", true),
                ("Which activities matter most to you?", false),
                ("Anything the interviewer should focus on?", false),
            ],
        },
    },
    Template {
        key: "general_job_interview",
        title: "General Job Interview",
        prompt: "You are a hiring manager running a behavioural interview. \
                 Ask about past experience, teamwork, conflict and motivation.",
        body: TemplateBody::Interview {
            default_question_count: 5,
            pre_questions: &[
                ("What role are you applying for?", true),
                ("What company is it at?", true),
                ("Paste the job description, if you have it.", false),
                ("How many years of experience do you have?", false),
            ],
        },
    },
    Template {
        key: "internship",
        title: "Internship Interview",
        prompt: "You are a recruiter interviewing a student for an internship. \
                 Ask about coursework, projects, learning goals and availability.",
        body: TemplateBody::Interview {
            default_question_count: 5,
            pre_questions: &[
                ("What internship position are you applying for?", true),
                ("What company or organisation is it at?", true),
                ("What is your current year and major?", true),
                ("Which project are you most proud of?", false),
                ("What do you hope to learn this summer?", false),
            ],
        },
    },
    Template {
        key: "persuasive_speech",
        title: "Persuasive Speech",
        prompt: "Deliver a speech that convinces the audience to adopt your position.",
        body: TemplateBody::Speech {
            target_duration_secs: 180,
        },
    },
    Template {
        key: "informative_speech",
        title: "Informative Speech",
        prompt: "Deliver a speech that explains a topic clearly to a general audience.",
        body: TemplateBody::Speech {
            target_duration_secs: 300,
        },
    },
    Template {
        key: "daily_reflection",
        title: "Daily Reflection",
        prompt: "Reflect on today out loud.",
        body: TemplateBody::Diary {
            questions: &[
                "What went well today?",
                "What was challenging?",
                "What will you do differently tomorrow?",
            ],
        },
    },
];

/// Looks up a built-in template by key.
pub fn find(key: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.key == key)
}

impl Template {
    pub fn kind(&self) -> ProfileKind {
        match self.body {
            TemplateBody::Interview { .. } => ProfileKind::Interview,
            TemplateBody::Speech { .. } => ProfileKind::Speech,
            TemplateBody::Diary { .. } => ProfileKind::Diary,
        }
    }

    /// Builds a fresh, not-started profile seeded from this template.
    pub fn instantiate(&self) -> Profile {
        let header = ProfileHeader::new(self.title, self.prompt);
        match self.body {
            TemplateBody::Interview {
                default_question_count,
                pre_questions,
            } => Profile::Interview(InterviewProfile {
                header,
                template_key: Some(self.key.to_string()),
                question_numbers: default_question_count,
                pre_questions: pre_questions
                    .iter()
                    .map(|(prompt, required)| PreQuestion::new(*prompt, *required))
                    .collect(),
                questions: Vec::new(),
                feedback: Vec::new(),
                overall_score: None,
            }),
            TemplateBody::Speech {
                target_duration_secs,
            } => Profile::Speech(SpeechProfile {
                header,
                template_key: Some(self.key.to_string()),
                target_duration_secs,
                transcript: String::new(),
                audio_path: None,
                feedback: Vec::new(),
                overall_score: None,
            }),
            TemplateBody::Diary { questions } => Profile::Diary(DiaryProfile {
                header,
                responses: questions.iter().map(|q| DiaryResponse::new(*q)).collect(),
            }),
        }
    }
}
