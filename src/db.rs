use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::justification::JustificationBatch;
use crate::models::{
    AttendanceRecord, AttendanceStatus, BatchResolution, JustificationRequest,
    JustificationStatus, Sprint,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

fn time(hour: u32, minute: u32) -> anyhow::Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0).context("invalid time")
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("9b2e4c71-5a3d-4f08-b6e1-7d4c2a9f0e13")?,
            "Marisol Quintero",
            "marisol.quintero@campus.edu",
            "Computer Engineering",
        ),
        (
            Uuid::parse_str("e41c8a26-0f7b-4d92-a3c5-58b1f6d0c7a4")?,
            "Tomas Herrera",
            "tomas.herrera@campus.edu",
            "Industrial Engineering",
        ),
    ];

    for (id, name, email, program) in students {
        sqlx::query(
            r#"
            INSERT INTO attendance_portal.students (id, full_name, email, program)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, program = EXCLUDED.program
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(program)
        .execute(pool)
        .await?;
    }

    for (code, name) in [
        ("INF-101", "Introduction to Programming"),
        ("MAT-200", "Linear Algebra"),
        ("FIS-110", "Physics I"),
    ] {
        sqlx::query(
            r#"
            INSERT INTO attendance_portal.courses (code, name)
            VALUES ($1, $2)
            ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(code)
        .bind(name)
        .execute(pool)
        .await?;
    }

    let sprints = vec![
        ("Sprint 1", date(2025, 3, 3)?, date(2025, 3, 16)?),
        ("Sprint 2", date(2025, 3, 17)?, date(2025, 3, 30)?),
    ];

    for (name, start, end) in sprints {
        sqlx::query(
            r#"
            INSERT INTO attendance_portal.sprints (id, name, start_date, end_date)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(start)
        .bind(end)
        .execute(pool)
        .await?;
    }

    // Marisol: solid in INF-101, slipping in MAT-200 across both sprints.
    let sessions = vec![
        ("seed-001", "marisol.quintero@campus.edu", "INF-101", date(2025, 3, 4)?, time(8, 30)?, "present"),
        ("seed-002", "marisol.quintero@campus.edu", "INF-101", date(2025, 3, 11)?, time(8, 30)?, "present"),
        ("seed-003", "marisol.quintero@campus.edu", "INF-101", date(2025, 3, 18)?, time(8, 30)?, "late"),
        ("seed-004", "marisol.quintero@campus.edu", "MAT-200", date(2025, 3, 5)?, time(10, 0)?, "absent"),
        ("seed-005", "marisol.quintero@campus.edu", "MAT-200", date(2025, 3, 12)?, time(10, 0)?, "present"),
        ("seed-006", "marisol.quintero@campus.edu", "MAT-200", date(2025, 3, 19)?, time(10, 0)?, "absent"),
        ("seed-007", "marisol.quintero@campus.edu", "MAT-200", date(2025, 3, 26)?, time(10, 0)?, "justified"),
        ("seed-008", "tomas.herrera@campus.edu", "FIS-110", date(2025, 3, 6)?, time(14, 0)?, "present"),
        ("seed-009", "tomas.herrera@campus.edu", "FIS-110", date(2025, 3, 13)?, time(14, 0)?, "late"),
    ];

    for (source_key, email, course, class_date, class_time, status) in sessions {
        let student_id = student_id_by_email(pool, email).await?;
        sqlx::query(
            r#"
            INSERT INTO attendance_portal.attendance
            (id, student_id, course_code, class_date, class_time, status, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course)
        .bind(class_date)
        .bind(class_time)
        .bind(status)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    // One batch justifying both MAT-200 absences with a single certificate.
    let batch_id = Uuid::parse_str("c7d35e18-2b94-4a6f-8e07-91f4a3b5d260")?;
    let marisol = student_id_by_email(pool, "marisol.quintero@campus.edu").await?;
    sqlx::query(
        r#"
        INSERT INTO attendance_portal.justification_batches (id, student_id)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(batch_id)
    .bind(marisol)
    .execute(pool)
    .await?;

    let decisions = vec![
        ("seed-004", "approved", date(2025, 3, 6)?.and_time(time(9, 0)?)),
        ("seed-006", "pending", date(2025, 3, 22)?.and_time(time(9, 0)?)),
    ];

    for (source_key, status, submitted_at) in decisions {
        let attendance_id: Uuid = sqlx::query(
            "SELECT id FROM attendance_portal.attendance WHERE source_key = $1",
        )
        .bind(source_key)
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO attendance_portal.justifications
            (id, batch_id, attendance_id, status, submitted_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (batch_id, attendance_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(batch_id)
        .bind(attendance_id)
        .bind(status)
        .bind(submitted_at)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn student_id_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM attendance_portal.students WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no student registered with email {email}"))?;

    Ok(row.get("id"))
}

pub async fn fetch_attendance(
    pool: &PgPool,
    student_id: Uuid,
    since_date: NaiveDate,
) -> anyhow::Result<Vec<AttendanceRecord>> {
    let rows = sqlx::query(
        "SELECT student_id, course_code, class_date, class_time, status \
         FROM attendance_portal.attendance \
         WHERE student_id = $1 AND class_date >= $2",
    )
    .bind(student_id)
    .bind(since_date)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let status: String = row.get("status");
        records.push(AttendanceRecord {
            student_id: row.get("student_id"),
            course_id: row.get("course_code"),
            class_date: row.get("class_date"),
            class_time: row.get("class_time"),
            status: status.parse()?,
        });
    }

    Ok(records)
}

pub async fn fetch_sprints(pool: &PgPool, since_date: NaiveDate) -> anyhow::Result<Vec<Sprint>> {
    let rows = sqlx::query(
        "SELECT name, start_date, end_date FROM attendance_portal.sprints \
         WHERE end_date >= $1 ORDER BY start_date",
    )
    .bind(since_date)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Sprint {
            name: row.get("name"),
            start: row.get("start_date"),
            end: row.get("end_date"),
        })
        .collect())
}

pub async fn fetch_batches(
    pool: &PgPool,
    student_id: Uuid,
) -> anyhow::Result<Vec<JustificationBatch>> {
    let rows = sqlx::query(
        "SELECT b.id AS batch_id, j.id, j.attendance_id, j.status, j.submitted_at, \
         j.review_comments, a.class_date, a.class_time \
         FROM attendance_portal.justification_batches b \
         JOIN attendance_portal.justifications j ON j.batch_id = b.id \
         JOIN attendance_portal.attendance a ON a.id = j.attendance_id \
         WHERE b.student_id = $1 \
         ORDER BY b.id, a.class_date, a.class_time",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    let mut grouped: Vec<(Uuid, Vec<JustificationRequest>)> = Vec::new();

    for row in rows {
        let batch_id: Uuid = row.get("batch_id");
        let status: String = row.get("status");
        let class_date: NaiveDate = row.get("class_date");
        let class_time: NaiveTime = row.get("class_time");
        let child = JustificationRequest {
            id: row.get("id"),
            attendance_id: row.get("attendance_id"),
            status: status.parse::<JustificationStatus>()?,
            class_date: Some(class_date.and_time(class_time)),
            submission_date: row.get::<Option<NaiveDateTime>, _>("submitted_at"),
            review_comments: row.get("review_comments"),
        };

        match grouped.last_mut() {
            Some((id, children)) if *id == batch_id => children.push(child),
            _ => grouped.push((batch_id, vec![child])),
        }
    }

    let mut batches = Vec::with_capacity(grouped.len());
    for (batch_id, children) in grouped {
        batches.push(JustificationBatch::new(batch_id, student_id, children)?);
    }

    Ok(batches)
}

/// Stores the derived status so the portal can list batches without recomputing.
pub async fn persist_batch_status(
    pool: &PgPool,
    resolution: &BatchResolution,
    resolved_at: NaiveDateTime,
) -> anyhow::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE attendance_portal.justification_batches
        SET aggregate_status = $2, within_deadline = $3, resolved_at = $4
        WHERE id = $1
        "#,
    )
    .bind(resolution.batch_id)
    .bind(resolution.aggregate_status.as_str())
    .bind(resolution.within_deadline.as_bool())
    .bind(resolved_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        warn!(batch_id = %resolution.batch_id, "batch vanished before its status was stored");
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        program: String,
        course_code: String,
        course_name: String,
        class_date: NaiveDate,
        class_time: NaiveTime,
        status: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let status: AttendanceStatus = row.status.parse()?;

        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO attendance_portal.students
            (id, full_name, email, program)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, program = EXCLUDED.program
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(&row.program)
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO attendance_portal.courses (code, name)
            VALUES ($1, $2)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&row.course_code)
        .bind(&row.course_name)
        .execute(pool)
        .await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_portal.attendance
            (id, student_id, course_code, class_date, class_time, status, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(&row.course_code)
        .bind(row.class_date)
        .bind(row.class_time)
        .bind(status.as_str())
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "imported attendance rows");
    Ok(inserted)
}
