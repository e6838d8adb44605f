use crate::analysis::models::StructuredResume;

/// Renders a `StructuredResume` as the plain text block sent for matching.
///
/// Sections appear in a fixed order (skills, experience, education) separated
/// by a blank line; empty sections are left out. `contact` is not included.
pub fn format_for_analysis(resume: &StructuredResume) -> String {
    let mut sections = Vec::with_capacity(3);

    if !resume.skills.is_empty() {
        sections.push(format!("Skills: {}", resume.skills.join(", ")));
    }
    if !resume.experience.is_empty() {
        sections.push(format!("Experience:\n{}", resume.experience.join("\n")));
    }
    if !resume.education.is_empty() {
        sections.push(format!("Education:\n{}", resume.education.join("\n")));
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(skills: &[&str], experience: &[&str], education: &[&str]) -> StructuredResume {
        StructuredResume {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience: experience.iter().map(|s| s.to_string()).collect(),
            education: education.iter().map(|s| s.to_string()).collect(),
            contact: "jane@example.com".to_string(),
        }
    }

    #[test]
    fn test_all_sections_in_fixed_order() {
        let text = format_for_analysis(&resume(
            &["Rust", "Go"],
            &["Engineer at A (2020-2023)", "Intern at B (2019)"],
            &["BSc CS"],
        ));
        assert_eq!(
            text,
            "Skills: Rust, Go\n\n\
             Experience:\nEngineer at A (2020-2023)\nIntern at B (2019)\n\n\
             Education:\nBSc CS"
        );
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        assert_eq!(
            format_for_analysis(&resume(&[], &["Engineer at A"], &[])),
            "Experience:\nEngineer at A"
        );
        assert_eq!(
            format_for_analysis(&resume(&["SQL"], &[], &["MSc"])),
            "Skills: SQL\n\nEducation:\nMSc"
        );
    }

    #[test]
    fn test_all_empty_yields_empty_string() {
        assert_eq!(format_for_analysis(&StructuredResume::default()), "");
    }

    #[test]
    fn test_contact_is_excluded() {
        let text = format_for_analysis(&resume(&["Rust"], &[], &[]));
        assert!(!text.contains("jane@example.com"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let r = resume(&["A", "B"], &["X"], &["Y"]);
        assert_eq!(format_for_analysis(&r), format_for_analysis(&r.clone()));
    }
}
