pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- articles table: one row per analysed URL, never updated
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    word_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_articles_url ON articles(url);

-- analysis table: append-only verdict log per article
CREATE TABLE IF NOT EXISTS analysis (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL REFERENCES articles(id),
    label TEXT NOT NULL,
    confidence INTEGER NOT NULL,
    category TEXT,
    reasoning_summary TEXT,
    red_flags TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_analysis_article_id ON analysis(article_id);
CREATE INDEX IF NOT EXISTS idx_analysis_created_at ON analysis(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_analysis_category ON analysis(category);
"#;
