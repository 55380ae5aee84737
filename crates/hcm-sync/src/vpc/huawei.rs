use super::VpcRules;
use crate::diff::same_set;
use hcm_cloud::HuaWeiVpcExtension;

impl VpcRules for HuaWeiVpcExtension {
    fn extension_changed(cloud: &Self, db: &Self) -> bool {
        !same_set(&cloud.cidr, &db.cidr)
            || cloud.status != db.status
            || cloud.enterprise_project_id != db.enterprise_project_id
    }
}
