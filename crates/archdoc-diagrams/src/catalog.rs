//! Catalog of cloud components that can appear in a diagram.
//!
//! Names are matched after normalization: case is ignored, spaces, dashes and
//! underscores are dropped, and a leading `Amazon` or `AWS` is stripped. So
//! `"Amazon API Gateway"`, `"api-gateway"` and `"APIGW"` all resolve to the
//! same component.

/// Grouping used for clustering and node styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Network,
    Compute,
    Database,
    Storage,
    Integration,
    Security,
    Analytics,
    Ml,
}

impl Category {
    /// Cluster label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Network => "Networking",
            Self::Compute => "Compute",
            Self::Database => "Database",
            Self::Storage => "Storage",
            Self::Integration => "Application Integration",
            Self::Security => "Security",
            Self::Analytics => "Analytics",
            Self::Ml => "Machine Learning",
        }
    }

    /// Identifier used for the DOT cluster name.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Compute => "compute",
            Self::Database => "database",
            Self::Storage => "storage",
            Self::Integration => "integration",
            Self::Security => "security",
            Self::Analytics => "analytics",
            Self::Ml => "ml",
        }
    }

    /// Node fill colour.
    #[must_use]
    pub fn fill_color(self) -> &'static str {
        match self {
            Self::Network => "#8C4FFF",
            Self::Compute => "#ED7100",
            Self::Database => "#C925D1",
            Self::Storage => "#7AA116",
            Self::Integration => "#E7157B",
            Self::Security => "#DD344C",
            Self::Analytics => "#3334B9",
            Self::Ml => "#01A88D",
        }
    }

    /// Node shape.
    #[must_use]
    pub fn shape(self) -> &'static str {
        match self {
            Self::Database => "cylinder",
            Self::Storage => "folder",
            Self::Integration => "cds",
            Self::Security => "octagon",
            Self::Network | Self::Compute | Self::Analytics | Self::Ml => "box",
        }
    }
}

/// A known component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Display name.
    pub name: &'static str,
    pub category: Category,
}

const fn component(name: &'static str, category: Category) -> Component {
    Component { name, category }
}

/// Normalized aliases and the component they resolve to.
const CATALOG: &[(&[&str], Component)] = &[
    // Networking
    (
        &["elb", "alb", "nlb", "loadbalancer", "elasticloadbalancing", "applicationloadbalancer", "networkloadbalancer"],
        component("Elastic Load Balancing", Category::Network),
    ),
    (&["cloudfront", "cdn"], component("CloudFront", Category::Network)),
    (&["route53", "dns"], component("Route 53", Category::Network)),
    (&["apigateway", "apigw", "api"], component("API Gateway", Category::Network)),
    (&["vpc"], component("VPC", Category::Network)),
    (&["natgateway", "nat"], component("NAT Gateway", Category::Network)),
    (&["directconnect"], component("Direct Connect", Category::Network)),
    // Compute
    (&["ec2", "instance", "vm"], component("EC2", Category::Compute)),
    (&["lambda", "lambdafunction"], component("Lambda", Category::Compute)),
    (&["ecs", "elasticcontainerservice"], component("ECS", Category::Compute)),
    (&["eks", "kubernetes"], component("EKS", Category::Compute)),
    (&["fargate"], component("Fargate", Category::Compute)),
    (&["elasticbeanstalk", "beanstalk"], component("Elastic Beanstalk", Category::Compute)),
    (&["batch"], component("Batch", Category::Compute)),
    (&["autoscaling", "asg", "autoscalinggroup"], component("Auto Scaling", Category::Compute)),
    // Database
    (&["rds", "relationaldatabaseservice"], component("RDS", Category::Database)),
    (&["aurora"], component("Aurora", Category::Database)),
    (&["dynamodb", "dynamo"], component("DynamoDB", Category::Database)),
    (&["elasticache", "redis", "memcached"], component("ElastiCache", Category::Database)),
    (&["neptune"], component("Neptune", Category::Database)),
    (&["documentdb", "docdb"], component("DocumentDB", Category::Database)),
    // Storage
    (&["s3", "simplestorageservice"], component("S3", Category::Storage)),
    (&["ebs", "elasticblockstore"], component("EBS", Category::Storage)),
    (&["efs", "elasticfilesystem"], component("EFS", Category::Storage)),
    (&["glacier", "s3glacier"], component("S3 Glacier", Category::Storage)),
    (&["backup"], component("Backup", Category::Storage)),
    // Application integration
    (&["sqs", "simplequeueservice", "queue"], component("SQS", Category::Integration)),
    (&["sns", "simplenotificationservice"], component("SNS", Category::Integration)),
    (&["eventbridge", "cloudwatchevents"], component("EventBridge", Category::Integration)),
    (&["stepfunctions", "sfn"], component("Step Functions", Category::Integration)),
    (&["mq"], component("MQ", Category::Integration)),
    // Security
    (&["cognito"], component("Cognito", Category::Security)),
    (&["iam"], component("IAM", Category::Security)),
    (&["kms", "keymanagementservice"], component("KMS", Category::Security)),
    (&["waf"], component("WAF", Category::Security)),
    (&["shield"], component("Shield", Category::Security)),
    (&["secretsmanager"], component("Secrets Manager", Category::Security)),
    (&["acm", "certificatemanager"], component("Certificate Manager", Category::Security)),
    // Analytics
    (&["kinesis", "kinesisdatastreams"], component("Kinesis", Category::Analytics)),
    (&["athena"], component("Athena", Category::Analytics)),
    (&["redshift"], component("Redshift", Category::Analytics)),
    (&["glue"], component("Glue", Category::Analytics)),
    (&["emr"], component("EMR", Category::Analytics)),
    (&["quicksight"], component("QuickSight", Category::Analytics)),
    (&["opensearch", "elasticsearch"], component("OpenSearch", Category::Analytics)),
    // Machine learning
    (&["bedrock"], component("Bedrock", Category::Ml)),
    (&["sagemaker"], component("SageMaker", Category::Ml)),
    (&["comprehend"], component("Comprehend", Category::Ml)),
    (&["rekognition"], component("Rekognition", Category::Ml)),
    (&["textract"], component("Textract", Category::Ml)),
    (&["lex"], component("Lex", Category::Ml)),
    (&["polly"], component("Polly", Category::Ml)),
];

/// Normalize a component name for lookup.
fn normalize(name: &str) -> String {
    let compact: String = name
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect();

    let stripped = compact
        .strip_prefix("amazon")
        .or_else(|| compact.strip_prefix("aws"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(&compact);
    stripped.to_owned()
}

/// Resolve a component name.
///
/// Returns `None` for names not in the catalog.
#[must_use]
pub fn lookup(name: &str) -> Option<Component> {
    let key = normalize(name);
    CATALOG
        .iter()
        .find(|(aliases, _)| aliases.contains(&key.as_str()))
        .map(|(_, component)| *component)
}
