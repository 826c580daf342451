//! Graduation thesis structure normalization
//!
//! Degree theses must follow a regulated section sequence regardless of
//! what the generation model produced. This pass splits the text on
//! top-level headings, recognizes the required sections by alias,
//! merges duplicates, inserts anything missing with a placeholder, and
//! emits everything in the canonical order. Unrecognized material is
//! preserved inside the body section.

/// The required sections, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Cover,
    IntegrityStatement,
    AuthorizationLetter,
    AbstractChinese,
    AbstractEnglish,
    Body,
    References,
    Acknowledgements,
}

const CANONICAL_ORDER: [Section; 8] = [
    Section::Cover,
    Section::IntegrityStatement,
    Section::AuthorizationLetter,
    Section::AbstractChinese,
    Section::AbstractEnglish,
    Section::Body,
    Section::References,
    Section::Acknowledgements,
];

impl Section {
    fn canonical_heading(self) -> &'static str {
        match self {
            Section::Cover => "封面",
            Section::IntegrityStatement => "诚信声明",
            Section::AuthorizationLetter => "授权书",
            Section::AbstractChinese => "中文摘要",
            Section::AbstractEnglish => "Abstract",
            Section::Body => "正文",
            Section::References => "参考文献",
            Section::Acknowledgements => "致谢",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Section::Cover => "（此处为论文封面）",
            Section::IntegrityStatement => "（此处为学术诚信声明）",
            Section::AuthorizationLetter => "（此处为论文使用授权书）",
            Section::AbstractChinese => "（此处为中文摘要）",
            Section::AbstractEnglish => "(English abstract)",
            Section::Body => "",
            Section::References => "（此处为参考文献列表）",
            Section::Acknowledgements => "（此处为致谢）",
        }
    }

    /// Recognize a heading by its aliases. Checked in order so the
    /// more specific abstract aliases win over the bare "摘要".
    fn recognize(heading: &str) -> Option<Self> {
        let h = heading.trim().to_lowercase();
        if h.is_empty() {
            return None;
        }
        if h.contains("封面") || h.contains("cover") {
            return Some(Section::Cover);
        }
        if h.contains("诚信") || h.contains("integrity") {
            return Some(Section::IntegrityStatement);
        }
        if h.contains("授权") || h.contains("authorization") {
            return Some(Section::AuthorizationLetter);
        }
        if h.contains("abstract") || (h.contains("摘要") && (h.contains("英") || h.contains("english"))) {
            return Some(Section::AbstractEnglish);
        }
        if h.contains("摘要") {
            return Some(Section::AbstractChinese);
        }
        if h.contains("参考文献") || h.contains("references") || h.contains("bibliography") {
            return Some(Section::References);
        }
        if h.contains("致谢") || h.contains("鸣谢") || h.contains("acknowledg") {
            return Some(Section::Acknowledgements);
        }
        if h.contains("正文") || h == "body" {
            return Some(Section::Body);
        }
        None
    }
}

/// Normalize free-form thesis text into the regulated section order.
///
/// The output contains every required heading exactly once as a level-1
/// heading, in canonical order; acknowledgements always follows
/// references. Content under unrecognized headings keeps its original
/// heading (demoted under the body section).
pub fn normalize_graduation_structure(input: &str) -> String {
    let mut collected: Vec<(Section, String)> = Vec::new();
    let mut body_parts: Vec<String> = Vec::new();

    let mut current: Option<Section> = None;
    let mut buffer = String::new();

    let flush = |current: &Option<Section>,
                 buffer: &mut String,
                 collected: &mut Vec<(Section, String)>,
                 body_parts: &mut Vec<String>| {
        let text = std::mem::take(buffer);
        let trimmed = text.trim();
        match current {
            Some(section) => collected.push((*section, trimmed.to_string())),
            None => {
                if !trimmed.is_empty() {
                    body_parts.push(trimmed.to_string());
                }
            }
        }
    };

    for line in input.lines() {
        let heading = line
            .trim_start()
            .strip_prefix("# ")
            .or_else(|| line.trim_start().strip_prefix("## "));

        if let Some(text) = heading {
            match Section::recognize(text) {
                Some(section) => {
                    flush(&current, &mut buffer, &mut collected, &mut body_parts);
                    current = Some(section);
                    continue;
                }
                None => {
                    // Unrecognized heading: demoted one level. In the
                    // body flow it starts a fresh body segment, inside a
                    // recognized section it stays with that section.
                    if current.is_none() || current == Some(Section::Body) {
                        flush(&current, &mut buffer, &mut collected, &mut body_parts);
                        current = None;
                    }
                    buffer.push_str(&format!("## {}\n", text.trim()));
                    continue;
                }
            }
        }

        buffer.push_str(line);
        buffer.push('\n');
    }
    flush(&current, &mut buffer, &mut collected, &mut body_parts);

    // Merge duplicates, keeping first-seen content first.
    let content_for = |target: Section, collected: &[(Section, String)]| -> Vec<String> {
        collected
            .iter()
            .filter(|(s, text)| *s == target && !text.is_empty())
            .map(|(_, text)| text.clone())
            .collect()
    };

    let mut out = String::new();
    for section in CANONICAL_ORDER {
        let mut parts = content_for(section, &collected);
        if section == Section::Body {
            parts.extend(body_parts.iter().cloned());
        }

        out.push_str(&format!("# {}\n\n", section.canonical_heading()));
        if parts.is_empty() {
            let placeholder = section.placeholder();
            if !placeholder.is_empty() {
                out.push_str(placeholder);
                out.push('\n');
            }
        } else {
            out.push_str(&parts.join("\n\n"));
            out.push('\n');
        }
        out.push('\n');
    }

    out.trim_end().to_string() + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading_positions(output: &str) -> Vec<(usize, String)> {
        output
            .lines()
            .enumerate()
            .filter(|(_, l)| l.starts_with("# "))
            .map(|(i, l)| (i, l[2..].to_string()))
            .collect()
    }

    const REQUIRED: [&str; 8] = [
        "封面",
        "诚信声明",
        "授权书",
        "中文摘要",
        "Abstract",
        "正文",
        "参考文献",
        "致谢",
    ];

    #[test]
    fn test_empty_input_yields_all_sections_in_order() {
        let output = normalize_graduation_structure("");
        let headings: Vec<String> =
            heading_positions(&output).into_iter().map(|(_, h)| h).collect();
        assert_eq!(headings, REQUIRED.to_vec());
    }

    #[test]
    fn test_each_heading_exactly_once() {
        let input = "# 摘要\n概述\n# 摘要\n重复的摘要\n# 参考文献\n[1] 某文献\n";
        let output = normalize_graduation_structure(input);
        for required in REQUIRED {
            let count = output
                .lines()
                .filter(|l| *l == format!("# {}", required))
                .count();
            assert_eq!(count, 1, "heading {} appears {} times", required, count);
        }
        // Duplicate section content merged
        assert!(output.contains("概述"));
        assert!(output.contains("重复的摘要"));
    }

    #[test]
    fn test_out_of_order_sections_are_relocated() {
        let input = "# 致谢\n感谢导师。\n# 参考文献\n[1] 文献\n# 中文摘要\n本文研究了。\n";
        let output = normalize_graduation_structure(input);
        let headings = heading_positions(&output);
        let pos = |name: &str| {
            headings
                .iter()
                .find(|(_, h)| h == name)
                .map(|(i, _)| *i)
                .unwrap()
        };
        assert!(pos("中文摘要") < pos("参考文献"));
        assert!(pos("参考文献") < pos("致谢"));
        assert!(output.contains("感谢导师。"));
        assert!(output.contains("[1] 文献"));
    }

    #[test]
    fn test_acknowledgements_follows_references() {
        let output = normalize_graduation_structure("# 致谢\n谢谢\n");
        let ref_pos = output.find("# 参考文献").unwrap();
        let ack_pos = output.find("# 致谢").unwrap();
        assert!(ack_pos > ref_pos);
    }

    #[test]
    fn test_unrecognized_content_lands_in_body() {
        let input = "# 引言\n研究背景介绍。\n# 实验\n实验设计。\n";
        let output = normalize_graduation_structure(input);
        let body_pos = output.find("# 正文").unwrap();
        let intro_pos = output.find("## 引言").unwrap();
        let exp_pos = output.find("## 实验").unwrap();
        let refs_pos = output.find("# 参考文献").unwrap();
        assert!(body_pos < intro_pos);
        assert!(intro_pos < exp_pos);
        assert!(exp_pos < refs_pos);
    }

    #[test]
    fn test_english_abstract_recognized() {
        let input = "# Abstract\nThis thesis studies...\n# 摘要\n中文内容\n";
        let output = normalize_graduation_structure(input);
        assert!(output.contains("This thesis studies..."));
        assert!(output.contains("中文内容"));
        let zh = output.find("# 中文摘要").unwrap();
        let en = output.find("# Abstract").unwrap();
        assert!(zh < en);
    }

    #[test]
    fn test_missing_sections_get_placeholders() {
        let output = normalize_graduation_structure("# 正文\n内容。\n");
        assert!(output.contains("（此处为学术诚信声明）"));
        assert!(output.contains("（此处为参考文献列表）"));
        assert!(output.contains("内容。"));
    }
}
