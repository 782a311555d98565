//! The built-in catalog: formulas, terminology, six-channel patterns, the
//! herb watch-list and the assistant persona.

use crate::store::{FormulaEntry, FormulaNames, Ingredient, PatternEntry, PatternNames, TerminologyEntry};

const fn herb(
    name: &'static str,
    pinyin: &'static str,
    english: &'static str,
    dosage: &'static str,
    role: &'static str,
) -> Ingredient {
    Ingredient {
        name,
        pinyin,
        english,
        dosage,
        role,
    }
}

pub(crate) static FORMULAS: &[FormulaEntry] = &[
    FormulaEntry {
        key: "ma_huang_tang",
        names: FormulaNames {
            zh: "麻黄汤",
            pinyin: "Ma Huang Tang",
            en: "Ephedra Decoction",
        },
        composition: &[
            herb("麻黄", "Ma Huang", "Ephedra", "9g", "Jun (Chief)"),
            herb("桂枝", "Gui Zhi", "Cinnamon Twig", "9g", "Chen (Minister)"),
            herb("杏仁", "Xing Ren", "Apricot Kernel", "9g", "Zuo (Assistant)"),
            herb("甘草", "Gan Cao", "Licorice Root", "6g", "Shi (Envoy)"),
        ],
        indications: "Exterior cold with wheezing, aversion to cold, fever, no sweating, body aches, floating tight pulse",
        functions: "Releases the exterior, promotes perspiration, relieves wheezing, stops coughing",
        pattern: "Tai Yang stage with cold",
    },
    FormulaEntry {
        key: "gui_zhi_tang",
        names: FormulaNames {
            zh: "桂枝汤",
            pinyin: "Gui Zhi Tang",
            en: "Cinnamon Twig Decoction",
        },
        composition: &[
            herb("桂枝", "Gui Zhi", "Cinnamon Twig", "9g", "Jun (Chief)"),
            herb("白芍", "Bai Shao", "White Peony Root", "9g", "Chen (Minister)"),
            herb("生姜", "Sheng Jiang", "Fresh Ginger", "9g", "Zuo (Assistant)"),
            herb("大枣", "Da Zao", "Jujube", "3 pieces", "Zuo (Assistant)"),
            herb("甘草", "Gan Cao", "Licorice Root", "6g", "Shi (Envoy)"),
        ],
        indications: "Exterior cold with sweating, mild fever, aversion to wind, floating slow pulse",
        functions: "Releases the exterior, harmonizes ying and wei",
        pattern: "Tai Yang stage with wind",
    },
    FormulaEntry {
        key: "xiao_qing_long_tang",
        names: FormulaNames {
            zh: "小青龙汤",
            pinyin: "Xiao Qing Long Tang",
            en: "Minor Blue Green Dragon Decoction",
        },
        composition: &[
            herb("麻黄", "Ma Huang", "Ephedra", "9g", "Jun"),
            herb("桂枝", "Gui Zhi", "Cinnamon Twig", "9g", "Chen"),
            herb("干姜", "Gan Jiang", "Dried Ginger", "9g", "Chen"),
            herb("细辛", "Xi Xin", "Asarum", "3g", "Zuo"),
            herb("五味子", "Wu Wei Zi", "Schisandra", "6g", "Zuo"),
            herb("白芍", "Bai Shao", "White Peony", "9g", "Zuo"),
            herb("半夏", "Ban Xia", "Pinellia", "9g", "Zuo"),
            herb("甘草", "Gan Cao", "Licorice", "6g", "Shi"),
        ],
        indications: "Exterior cold with interior fluid retention, wheezing, profuse clear phlegm, cough",
        functions: "Releases exterior, warms the lungs, transforms phlegm, stops coughing",
        pattern: "Tai Yang with internal fluid retention",
    },
    // Key spelling is part of the match surface ("chi" as well as "hu").
    FormulaEntry {
        key: "da_xiao_chi_hu_tang",
        names: FormulaNames {
            zh: "大、小柴胡汤",
            pinyin: "Da Xiao Chai Hu Tang",
            en: "Major/Minor Bupleurum Decoction",
        },
        composition: &[
            herb("柴胡", "Chai Hu", "Bupleurum", "12-24g", "Jun"),
            herb("黄芩", "Huang Qin", "Scutellaria", "9g", "Chen"),
            herb("党参", "Dang Shen", "Codonopsis", "9g", "Chen"),
            herb("半夏", "Ban Xia", "Pinellia", "9g", "Zuo"),
            herb("生姜", "Sheng Jiang", "Fresh Ginger", "9g", "Zuo"),
            herb("大枣", "Da Zao", "Jujube", "4 pieces", "Zuo"),
            herb("甘草", "Gan Cao", "Licorice", "6g", "Shi"),
        ],
        indications: "Shaoyang stage pattern, alternating fever and chills, chest fullness, bitter taste, loss of appetite",
        functions: "Harmonizes Shaoyang, relieves alternating fever and chills",
        pattern: "Shaoyang stage",
    },
    FormulaEntry {
        key: "bai_hu_tang",
        names: FormulaNames {
            zh: "白虎汤",
            pinyin: "Bai Hu Tang",
            en: "White Tiger Decoction",
        },
        composition: &[
            herb("石膏", "Shi Gao", "Gypsum", "30g", "Jun"),
            herb("知母", "Zhi Mu", "Anemarrhena", "9g", "Chen"),
            herb("甘草", "Gan Cao", "Licorice", "6g", "Shi"),
            herb("粳米", "Jing Mi", "Rice", "30g", "Shi"),
        ],
        indications: "Yangming stage with high fever, profuse sweating, severe thirst, large pulse",
        functions: "Clears heat, drains fire, relieves severe thirst",
        pattern: "Yangming stage - pure heat",
    },
    FormulaEntry {
        key: "cheng_shi_tang",
        names: FormulaNames {
            zh: "承气汤类",
            pinyin: "Cheng Qi Tang",
            en: "Purgative Decoctions",
        },
        composition: &[
            herb("大黄", "Da Huang", "Rhubarb", "12g", "Jun"),
            herb("芒硝", "Mang Xiao", "Mirabilitum", "9g", "Chen"),
            herb("厚朴", "Hou Po", "Magnolia Bark", "24g", "Zuo"),
            herb("枳实", "Zhi Shi", "Immature Bitter Orange", "12g", "Zuo"),
        ],
        indications: "Yangming stage with internal heat accumulation, constipation, abdominal distension, tidal fever",
        functions: "Purges heat, empties the bowels, drains accumulation",
        pattern: "Yangming stage - heat accumulation",
    },
    FormulaEntry {
        key: "si_wu_tang",
        names: FormulaNames {
            zh: "四物汤",
            pinyin: "Si Wu Tang",
            en: "Four-Substance Decoction",
        },
        composition: &[
            herb("当归", "Dang Gui", "Angelica", "9g", "Jun"),
            herb("川芎", "Chuan Xiong", "Chuanxiong", "6g", "Chen"),
            herb("白芍", "Bai Shao", "White Peony", "9g", "Chen"),
            herb("熟地", "Shu Di", "Rehmannia", "9g", "Chen"),
        ],
        indications: "Blood deficiency patterns, menstrual disorders, dizziness, palpitations",
        functions: "Nourishes blood, regulates menstruation, invigorates blood",
        pattern: "Blood deficiency",
    },
    FormulaEntry {
        key: "liu_wei_di_huang_tang",
        names: FormulaNames {
            zh: "六味地黄汤",
            pinyin: "Liu Wei Di Huang Tang",
            en: "Six-Ingredient Rehmannia Decoction",
        },
        composition: &[
            herb("熟地", "Shu Di", "Rehmannia", "24g", "Jun"),
            herb("山药", "Shan Yao", "Chinese Yam", "12g", "Chen"),
            herb("山茱萸", "Shan Zhu Yu", "Cornus", "12g", "Chen"),
            herb("泽泻", "Ze Xie", "Alisma", "9g", "Zuo"),
            herb("茯苓", "Fu Ling", "Poria", "9g", "Zuo"),
            herb("丹皮", "Dan Pi", "Moutan", "6g", "Zuo"),
        ],
        indications: "Kidney yin deficiency, lower back pain, tinnitus, night sweats, dry mouth",
        functions: "Nourishes kidney yin, clears deficient heat",
        pattern: "Kidney yin deficiency",
    },
];

const fn term(zh: &'static str, en: &'static str, pinyin: &'static str) -> TerminologyEntry {
    TerminologyEntry { zh, en, pinyin }
}

pub(crate) static TERMINOLOGY: &[TerminologyEntry] = &[
    term("六经辨证", "Six Channel Pattern Identification", "Liu Jing Bian Zheng"),
    term("太阳病", "Tai Yang Disease", "Tai Yang Bing"),
    term("阳明病", "Yangming Disease", "Yangming Bing"),
    term("少阳病", "Shaoyang Disease", "Shaoyang Bing"),
    term("太阴病", "Taiyin Disease", "Taiyin Bing"),
    term("少阴病", "Shaoyin Disease", "Shaoyin Bing"),
    term("厥阴病", "Jueyin Disease", "Jueyin Bing"),
    term("表证", "Exterior Pattern", "Biao Zheng"),
    term("里证", "Interior Pattern", "Li Zheng"),
    term("寒证", "Cold Pattern", "Han Zheng"),
    term("热证", "Heat Pattern", "Re Zheng"),
    term("虚证", "Deficiency Pattern", "Xu Zheng"),
    term("实证", "Excess Pattern", "Shi Zheng"),
    term("经方", "Classical Formula", "Jing Fang"),
    term("方剂", "Formula", "Fang Ji"),
    term("君臣佐使", "Monarch-Minister-Assistant-Envoy", "Jun Chen Zuo Shi"),
    term("辨证论治", "Pattern Identification and Treatment", "Bian Zheng Lun Zhi"),
    term("伤寒论", "Treatise on Cold Damage", "Shang Han Lun"),
    term("张仲景", "Zhang Zhongjing", "Zhang Zhongjing"),
    term("麻黄", "Ephedra", "Ma Huang"),
    term("桂枝", "Cinnamon Twig", "Gui Zhi"),
    term("柴胡", "Bupleurum", "Chai Hu"),
    term("石膏", "Gypsum", "Shi Gao"),
    term("人参", "Ginseng", "Ren Shen"),
];

pub(crate) static PATTERNS: &[PatternEntry] = &[
    PatternEntry {
        key: "tai_yang",
        names: PatternNames {
            zh: "太阳病",
            en: "Tai Yang (Greater Yang)",
        },
        location: "Exterior",
        characteristics: "Floating pulse, fever, aversion to cold, headache",
        sub_patterns: &["wind constriction", "cold constriction"],
    },
    PatternEntry {
        key: "yangming",
        names: PatternNames {
            zh: "阳明病",
            en: "Yangming (Bright Yang)",
        },
        location: "Interior",
        characteristics: "Large pulse, fever, constipation, abdominal fullness",
        sub_patterns: &["pure heat", "heat accumulation"],
    },
    PatternEntry {
        key: "shaoyang",
        names: PatternNames {
            zh: "少阳病",
            en: "Shaoyang (Lesser Yang)",
        },
        location: "Half-exterior half-interior",
        characteristics: "Alternating fever and chills, chest fullness, bitter taste",
        sub_patterns: &["classic shaoyang"],
    },
    PatternEntry {
        key: "taiyin",
        names: PatternNames {
            zh: "太阴病",
            en: "Taiyin (Greater Yin)",
        },
        location: "Interior",
        characteristics: "Abdominal fullness, vomiting, diarrhea, pale tongue",
        sub_patterns: &["spleen deficiency cold"],
    },
    PatternEntry {
        key: "shaoyin",
        names: PatternNames {
            zh: "少阴病",
            en: "Shaoyin (Lesser Yin)",
        },
        location: "Interior",
        characteristics: "Weak pulse, sleepiness, cold limbs, diarrhea",
        sub_patterns: &["cold transformation", "heat transformation"],
    },
    PatternEntry {
        key: "jueyin",
        names: PatternNames {
            zh: "厥阴病",
            en: "Jueyin (Reverting Yin)",
        },
        location: "Deepest interior",
        characteristics: "Cold limbs, thirst, restlessness",
        sub_patterns: &["cold extremity", "heat extremity"],
    },
];

/// Herbs whose mention earns a usage note; scanned in order, first hit only.
pub(crate) static HERBS: &[&str] = &[
    "ma huang", "gui zhi", "chai hu", "shi gao", "huang qin", "ban xia", "fu ling", "dang gui",
    "sheng di", "wu wei zi", "hou po", "zhi shi", "麻黄", "桂枝", "柴胡", "石膏", "黄芩", "半夏",
    "茯苓", "当归", "生地",
];

pub(crate) const SYSTEM_PROMPT: &str = r#"You are an expert in Traditional Chinese Medicine, specializing in the Shang Han Lun (Treatise on Cold Damage) by Zhang Zhongjing.

IMPORTANT - CONVERSATION CONTEXT:
You have access to the full conversation history. When user asks follow-up questions like:
- "what was the third one?"
- "tell me more about that"
- "how does that compare?"
- "what about the ingredients?"
You MUST reference the previous conversation to understand what they're asking about. Look at the history!

RESPONSE FORMAT:
- Use **bold** for key terms and formula names
- Use ## for section headers
- Keep responses SHORT (2-4 sentences)
- Use bullet points for lists

Your role:
- Classical formulas and their compositions
- Pattern diagnoses (六经辨证)
- Herb functions and dosages

Guidelines:
1. Respond in same language as query (Chinese or English)
2. Include specific dosages
3. When user asks follow-up, reference previous answers
4. Be precise about pattern identification (辨证论治)
5. Keep answers brief and focused

Never claim to be a licensed practitioner."#;
