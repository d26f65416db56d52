//! Project scaffolding: the Vite + React + Tailwind tree that gets pushed to
//! the new repository, with the resume frozen into `src/App.tsx`.

use serde_json::json;

use crate::deploy::files::{FileEntry, FileSet, WORKFLOW_PATH};
use crate::deploy::workflow::render_workflow;
use crate::models::{ResumeData, Theme, ThemeColors};

const TAILWIND_CONFIG: &str = r#"/** @type {import('tailwindcss').Config} */
export default {
  content: ["./index.html", "./src/**/*.{js,ts,jsx,tsx}"],
  darkMode: 'class',
  theme: {
    extend: {
      fontFamily: {
        sans: ['Inter', 'sans-serif'],
        mono: ['JetBrains Mono', 'monospace'],
        serif: ['Playfair Display', 'serif'],
      },
    },
  },
  plugins: [],
}
"#;

const POSTCSS_CONFIG: &str = r#"export default {
  plugins: { tailwindcss: {}, autoprefixer: {} },
};
"#;

const MAIN_TSX: &str = r#"import React from 'react';
import ReactDOM from 'react-dom/client';
import App from './App.tsx';
import './index.css';

ReactDOM.createRoot(document.getElementById('root')!).render(
  <React.StrictMode>
    <App />
  </React.StrictMode>
);
"#;

const INDEX_CSS: &str = "@tailwind base;\n@tailwind components;\n@tailwind utilities;\n";

const FONT_LINK: &str = "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;600;700&family=JetBrains+Mono:wght@400;700&family=Playfair+Display:wght@400;700&display=swap";

/// Component body of the exported snapshot. Expects `data`, `customColors`,
/// `SHELL_CLASSES`, `CARD_CLASSES` and `THEME` to be declared above it.
const APP_BODY: &str = r#"
const Section = ({ title, children }) => (
  <section className={CARD_CLASSES}>
    <h2 className="text-2xl font-bold mb-4" style={{ color: customColors.primary }}>
      {title}
    </h2>
    {children}
  </section>
);

const ContactLink = ({ href, label }) =>
  href ? (
    <a href={href} className="underline underline-offset-4 hover:opacity-80" target="_blank" rel="noreferrer">
      {label}
    </a>
  ) : null;

export default function App() {
  const { personalInfo, experience = [], education = [], skills = [], projects = [] } = data;

  return (
    <div className={SHELL_CLASSES} data-theme={THEME}>
      <main className="max-w-4xl mx-auto px-6 py-16 space-y-8">
        <header className="space-y-3">
          <h1 className="text-5xl font-bold" style={{ color: customColors.primary }}>
            {personalInfo.name}
          </h1>
          <p className="text-xl opacity-80">{personalInfo.title}</p>
          <p className="whitespace-pre-wrap">{personalInfo.summary}</p>
          <nav className="flex flex-wrap gap-4 text-sm">
            <ContactLink href={personalInfo.email && `mailto:${personalInfo.email}`} label={personalInfo.email} />
            <ContactLink href={personalInfo.linkedin} label="LinkedIn" />
            <ContactLink href={personalInfo.github} label="GitHub" />
            <ContactLink href={personalInfo.website} label="Website" />
            {personalInfo.location && <span>{personalInfo.location}</span>}
          </nav>
        </header>

        {experience.length > 0 && (
          <Section title="Experience">
            <div className="space-y-6">
              {experience.map((exp, i) => (
                <article key={i}>
                  <h3 className="text-lg font-semibold">
                    {exp.role} <span className="opacity-70">@ {exp.company}</span>
                  </h3>
                  <p className="text-sm opacity-60">
                    {exp.startDate} – {exp.endDate}
                  </p>
                  <ul className="list-disc ml-5 mt-2 space-y-1">
                    {exp.description.map((line, j) => (
                      <li key={j}>{line}</li>
                    ))}
                  </ul>
                </article>
              ))}
            </div>
          </Section>
        )}

        {projects.length > 0 && (
          <Section title="Projects">
            <div className="grid gap-4 md:grid-cols-2">
              {projects.map((project, i) => (
                <article key={i} className="space-y-2">
                  <h3 className="text-lg font-semibold">
                    {project.link ? <a href={project.link} className="underline">{project.name}</a> : project.name}
                  </h3>
                  <p>{project.description}</p>
                  <p className="text-xs font-mono" style={{ color: customColors.secondary }}>
                    {project.technologies.join(' · ')}
                  </p>
                </article>
              ))}
            </div>
          </Section>
        )}

        {skills.length > 0 && (
          <Section title="Skills">
            <ul className="flex flex-wrap gap-2">
              {skills.map((skill, i) => (
                <li key={i} className="px-3 py-1 rounded-full border" style={{ borderColor: customColors.primary }}>
                  {skill}
                </li>
              ))}
            </ul>
          </Section>
        )}

        {education.length > 0 && (
          <Section title="Education">
            <ul className="space-y-2">
              {education.map((edu, i) => (
                <li key={i}>
                  <span className="font-semibold">{edu.degree}</span>, {edu.school}
                  {edu.year && <span className="opacity-60"> ({edu.year})</span>}
                </li>
              ))}
            </ul>
          </Section>
        )}
      </main>
    </div>
  );
}
"#;

/// Builds the deployable file set for a resume and theme.
pub fn build(
    resume: &ResumeData,
    theme: Theme,
    colors: &ThemeColors,
    repo_name: &str,
    enable_static_hosting: bool,
) -> Vec<FileEntry> {
    build_with_files(
        resume,
        theme,
        colors,
        repo_name,
        enable_static_hosting,
        Vec::new(),
    )
}

/// Like [`build`], with caller-edited files layered over the scaffolding.
/// Caller files replace scaffold files of the same path, except the reserved
/// workflow, which is always the builder's own.
pub fn build_with_files(
    resume: &ResumeData,
    theme: Theme,
    colors: &ThemeColors,
    repo_name: &str,
    enable_static_hosting: bool,
    user_files: impl IntoIterator<Item = FileEntry>,
) -> Vec<FileEntry> {
    let mut set = FileSet::new();
    let name = &resume.personal_info.name;

    set.insert("package.json", package_json(repo_name));
    set.insert("tailwind.config.js", TAILWIND_CONFIG);
    set.insert("postcss.config.js", POSTCSS_CONFIG);
    set.insert("vite.config.ts", vite_config(repo_name, enable_static_hosting));
    set.insert("index.html", index_html(name));
    set.insert("src/main.tsx", MAIN_TSX);
    set.insert("src/index.css", INDEX_CSS);
    set.insert("src/App.tsx", app_source(theme, resume, colors));
    set.insert(
        "README.md",
        format!("# {name}'s Portfolio\n\nGenerated from a resume with the {theme} theme.\n"),
    );

    set.extend(user_files);

    // Inserted last so nothing the caller sent can replace it.
    if enable_static_hosting {
        set.insert(WORKFLOW_PATH, render_workflow("main"));
    }

    set.into_entries()
}

fn package_json(repo_name: &str) -> String {
    let manifest = json!({
        "name": repo_name,
        "version": "1.0.0",
        "private": true,
        "type": "module",
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview"
        },
        "dependencies": {
            "react": "^18.2.0",
            "react-dom": "^18.2.0",
            "framer-motion": "^10.16.4",
            "lucide-react": "^0.263.1",
            "clsx": "^2.0.0",
            "tailwind-merge": "^1.14.0"
        },
        "devDependencies": {
            "@types/react": "^18.2.15",
            "@types/react-dom": "^18.2.7",
            "@vitejs/plugin-react": "^4.0.3",
            "autoprefixer": "^10.4.14",
            "postcss": "^8.4.27",
            "tailwindcss": "^3.3.3",
            "typescript": "^5.0.2",
            "vite": "^4.4.5"
        }
    });
    serde_json::to_string_pretty(&manifest).unwrap_or_default()
}

/// Pages serves project sites from `/{repo}/`, so assets need that base.
fn vite_config(repo_name: &str, subpath_hosting: bool) -> String {
    let base = if subpath_hosting {
        format!("/{repo_name}/")
    } else {
        "/".to_string()
    };
    format!(
        "import {{ defineConfig }} from 'vite';\nimport react from '@vitejs/plugin-react';\n\nexport default defineConfig({{\n  plugins: [react()],\n  base: '{base}',\n}});\n"
    )
}

fn index_html(name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{} - Portfolio</title>
    <link href="{FONT_LINK}" rel="stylesheet">
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="src/main.tsx"></script>
  </body>
</html>
"#,
        escape_html(name)
    )
}

/// Read-only rendering of the chosen theme: resume and colors are inlined as
/// literals, there is no runtime fetch and no edit capability.
pub fn app_source(theme: Theme, resume: &ResumeData, colors: &ThemeColors) -> String {
    let data = serde_json::to_string_pretty(resume).unwrap_or_else(|_| "{}".to_string());
    let colors = serde_json::to_string_pretty(colors).unwrap_or_else(|_| "{}".to_string());

    let mut src = String::from("import React from 'react';\n\n");
    src.push_str(&format!("const data = {data};\n\n"));
    src.push_str(&format!("const customColors = {colors};\n\n"));
    src.push_str(&format!("const THEME = {};\n", js_string(theme.name())));
    src.push_str(&format!(
        "const SHELL_CLASSES = {};\n",
        js_string(theme.shell_classes())
    ));
    src.push_str(&format!(
        "const CARD_CLASSES = {};\n",
        js_string(theme.card_classes())
    ));
    src.push_str(APP_BODY);
    src
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
