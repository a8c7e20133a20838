// ==========================================
// 教务数据同步系统 - 学生档案刷新
// ==========================================
// 流程: 以学生本人身份登录 → 读取个人信息 → 转换 → 写入完整档案
// 说明:
// - 性别取自个人信息页（男/女），不依赖名册姓名标记
// - 校区取自登录会话
// - 身份证号由仓储层校验
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info};

use crate::domain::student::{Student, StudentProfile};
use crate::domain::types::{Campus, Sex};
use crate::engine::error::{Branch, SyncError, SyncResult};
use crate::engine::events::{OptionalEventPublisher, SyncEvent, SyncEventPublisher};
use crate::portal::{Credentials, PortalClient, PortalError, PortalSession, StudentProfileRecord};
use crate::repository::SyncRepository;

/// 个人信息页中“可选课”的肯定取值
pub const CAN_SELECT_LABEL: &str = "能";

/// 生日格式
pub const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// 将个人信息记录转换为学生档案
pub fn student_from_profile(
    record: &StudentProfileRecord,
    campus: Campus,
) -> Result<Student, PortalError> {
    let birthday = match record.birthday.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(NaiveDate::parse_from_str(raw, BIRTHDAY_FORMAT).map_err(|e| {
            PortalError::malformed("profile", format!("生日格式错误 {}: {}", raw, e))
        })?),
    };

    Ok(Student {
        code: record.code.clone(),
        name: record.name.clone(),
        sex: Some(Sex::from_label(&record.sex_label)),
        profile: StudentProfile {
            id_card_number: record.id_card_number.clone(),
            photo: record.photo.clone(),
            birthday,
            phone: record.phone.clone(),
            home_phone: record.home_phone.clone(),
            campus: Some(campus),
            college: record.college.clone(),
            major: record.major.clone(),
            klass: record.klass.clone(),
            nation: record.nation.clone(),
            native_place: record.native_place.clone(),
            home_address: record.home_address.clone(),
            admission_type: record.admission_type.clone(),
            admission_date: record.admission_date.clone(),
            examinee_code: record.examinee_code.clone(),
            high_school: record.high_school.clone(),
            student_origin: record.student_origin.clone(),
            foreign_language: record.foreign_language.clone(),
            can_select_courses: record.can_select_label.trim() == CAN_SELECT_LABEL,
            politics_status: record.politics_status.clone(),
            marital_status: record.marital_status.clone(),
            school_roll_status: record.school_roll_status.clone(),
            registration_status: record.registration_status.clone(),
        },
    })
}

// ==========================================
// ProfileRefresher - 档案刷新
// ==========================================
pub struct ProfileRefresher<P>
where
    P: PortalClient,
{
    client: Arc<P>,
    repo: Arc<dyn SyncRepository>,
    publisher: OptionalEventPublisher,
}

impl<P> ProfileRefresher<P>
where
    P: PortalClient,
{
    pub fn new(client: Arc<P>, repo: Arc<dyn SyncRepository>) -> Self {
        Self {
            client,
            repo,
            publisher: OptionalEventPublisher::none(),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn SyncEventPublisher>) -> Self {
        self.publisher = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    /// 刷新学生本人档案
    pub async fn refresh(&self, credentials: &Credentials) -> SyncResult<Student> {
        let session = match self.client.authenticate(credentials).await {
            Ok(session) => session,
            Err(e) => {
                error!(account = %credentials.code, error = %e, "档案刷新登录失败");
                self.publisher.publish(SyncEvent::AuthFailed {
                    account_code: credentials.code.clone(),
                    reason: e.to_string(),
                });
                return Err(SyncError::Authentication(e));
            }
        };
        self.publisher.publish(SyncEvent::AuthSucceeded {
            account_code: session.account_code().to_string(),
            campus: session.campus(),
        });

        let branch = Branch::Profile {
            code: credentials.code.clone(),
        };
        let record = session
            .get_my_profile()
            .await
            .map_err(|e| SyncError::from_portal(branch.clone(), e))?;
        let student = student_from_profile(&record, session.campus())
            .map_err(|e| SyncError::from_portal(branch, e))?;

        let created = self.repo.upsert_student_profile(&student)?;
        info!(student = %student, created, "学生档案刷新完成");
        Ok(student)
    }
}
