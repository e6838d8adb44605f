// Prompt templates for the two analysis stages.

/// System instruction for turning raw resume text into a `StructuredResume`.
pub const RESUME_EXTRACTION_SYSTEM: &str = r#"You are an expert resume parser. Extract structured information from the resume text the user provides.

Return a JSON object with EXACTLY these four fields:
{
  "skills": ["JavaScript", "React", "Node.js", "Team leadership"],
  "experience": [
    "Senior Software Engineer at Acme Corp (2020-2023): Led a team of 5, built payment APIs in Node.js",
    "Software Engineer at Initech (2017-2020): Developed internal React dashboards"
  ],
  "education": [
    "BSc Computer Science, University of Toronto (2017)"
  ],
  "contact": "jane.doe@example.com | +1 555 0100 | linkedin.com/in/janedoe"
}

Field rules:
- "skills": every technical skill, tool, framework, language, and soft skill mentioned. Array of strings.
- "experience": one string per role combining title, employer, dates, and key responsibilities. Array of strings.
- "education": one string per degree, certification, or qualification. Array of strings.
- "contact": email, phone, and profile links joined into one string. Use "Not provided" if none are present.

Use empty arrays when a section is absent. Do NOT invent information that is not in the text.
Respond with the JSON object only."#;

/// Resume extraction user payload. Replace `{resume_text}` before sending.
pub const RESUME_EXTRACTION_PROMPT: &str = r#"Extract the structured resume data from the following resume text.

RESUME TEXT:
{resume_text}"#;

/// System instruction for comparing a resume with a job description.
pub const MATCH_ANALYSIS_SYSTEM: &str = r#"You are an expert technical recruiter and career coach. Compare the candidate's resume with the job description the user provides.

Return a JSON object with EXACTLY these four fields:
{
  "matchPercentage": 65,
  "matchedSkills": ["Python", "REST APIs", "Communication"],
  "missingSkills": ["Kubernetes", "Terraform"],
  "suggestions": [
    "Add a project that deploys a service to Kubernetes",
    "Quantify the impact of your API work with latency or traffic numbers"
  ]
}

Field rules:
- "matchPercentage": a number from 0 to 100. Be conservative and realistic, not optimistic. Only count skills and experience the resume actually shows.
- "matchedSkills": skills required or preferred by the job that the resume demonstrates. Consider technical skills, tools, frameworks, and soft skills.
- "missingSkills": skills the job asks for that the resume does not show. Consider technical skills, tools, frameworks, and soft skills.
- "suggestions": 2 to 5 concrete, actionable improvements the candidate can make to the resume for this job.

Respond with the JSON object only."#;

/// Builds the match analysis user payload with both texts verbatim.
pub fn match_analysis_prompt(resume_text: &str, job_description: &str) -> String {
    format!(
        "Analyze how well this resume matches the job description.\n\n\
         RESUME:\n{resume_text}\n\n\
         JOB DESCRIPTION:\n{job_description}"
    )
}

/// Builds the extraction user payload with the resume text verbatim.
pub fn resume_extraction_prompt(resume_text: &str) -> String {
    RESUME_EXTRACTION_PROMPT.replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_embeds_text_verbatim() {
        let prompt = resume_extraction_prompt("Jane Doe\nRust, Go");
        assert!(prompt.ends_with("Jane Doe\nRust, Go"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_match_prompt_keeps_placeholder_like_text_intact() {
        let prompt = match_analysis_prompt("uses {job_description} literally", "Rust role");
        assert!(prompt.contains("uses {job_description} literally"));
        assert!(prompt.ends_with("JOB DESCRIPTION:\nRust role"));
    }

    #[test]
    fn test_system_prompts_name_every_field() {
        for field in ["\"skills\"", "\"experience\"", "\"education\"", "\"contact\""] {
            assert!(RESUME_EXTRACTION_SYSTEM.contains(field));
        }
        for field in [
            "\"matchPercentage\"",
            "\"matchedSkills\"",
            "\"missingSkills\"",
            "\"suggestions\"",
        ] {
            assert!(MATCH_ANALYSIS_SYSTEM.contains(field));
        }
    }
}
