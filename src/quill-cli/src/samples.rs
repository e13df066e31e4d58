//! Built-in sample transcripts.

use clap::ValueEnum;

/// Sample dialogue shipped with the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Sample {
    /// Job interview
    Interview,
    /// Doctor's appointment
    Medical,
    /// Legal consultation
    Legal,
}

impl Sample {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Interview => "Interview",
            Self::Medical => "Doctor visit",
            Self::Legal => "Legal consultation",
        }
    }

    /// Transcript text, one speaker turn per line.
    pub fn text(&self) -> &'static str {
        match self {
            Self::Interview => concat!(
                "面试官: 你好，请简单介绍一下自己。\n",
                "我: 你好，我是张三，有三年的软件开发经验，熟悉React和Node.js。\n",
                "面试官: 你之前做过什么项目？\n",
                "我: 我主要负责过电商网站的前端开发，包括用户界面设计和交互功能实现。",
            ),
            Self::Medical => concat!(
                "医生: 你好，今天感觉怎么样？\n",
                "我: 还好，就是有点头痛。\n",
                "医生: 头痛多久了？\n",
                "我: 大概两天了，昨天开始的。\n",
                "医生: 有没有其他症状？\n",
                "我: 还有点发烧，体温大概37.8度。",
            ),
            Self::Legal => concat!(
                "律师: 请描述一下您遇到的法律问题。\n",
                "我: 我和房东因为租金问题产生了纠纷。\n",
                "律师: 具体是什么情况？\n",
                "我: 合同约定的租金是3000元，但房东突然要求涨到3500元。",
            ),
        }
    }
}
